use super::history::{CellHistory, HistoryKind};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};
use std::fmt;

/// Opaque short identifier of a cell, e.g. `c-3f9a1b`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CellId(String);

impl CellId {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CellId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Arena position of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Position) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Clamps both coordinates into `[0, bound]`.
    pub fn clamped(self, bound: f64) -> Self {
        Self {
            x: self.x.clamp(0.0, bound),
            y: self.y.clamp(0.0, bound),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Waking state of a living cell. Meaningless once the cell is dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellStatus {
    Active,
    Sleeping,
}

/// One autonomous agent in the network.
///
/// Cells are owned exclusively by the registry; everything else refers to
/// them by id. All mutation goes through the registry so that `version`
/// bumps and history entries cannot be forgotten at a call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cell {
    pub id: CellId,
    pub age: u32,
    pub expertise: String,
    pub goal: String,
    pub position: Position,
    /// Recent positions, most-recent-last. Render-only trail; truncation is
    /// never a semantic loss.
    pub position_history: VecDeque<Position>,
    pub is_alive: bool,
    pub status: CellStatus,
    pub last_active_tick: u64,
    pub version: u64,
    pub liked_cells: BTreeSet<CellId>,
    pub history: CellHistory,
    pub indicator_color: Option<String>,
}

impl Cell {
    /// Builds a newborn cell at `version` 1 with a single `init` entry.
    pub fn new(
        id: CellId,
        expertise: impl Into<String>,
        goal: impl Into<String>,
        position: Position,
        tick: u64,
        parent: Option<&CellId>,
    ) -> Self {
        let mut history = CellHistory::default();
        let text = match parent {
            Some(p) => format!("cloned from {p}"),
            None => "initialized".to_string(),
        };
        history.record(HistoryKind::Init, 0, text);
        Self {
            id,
            age: 0,
            expertise: expertise.into(),
            goal: goal.into(),
            position,
            position_history: VecDeque::from([position]),
            is_alive: true,
            status: CellStatus::Active,
            last_active_tick: tick,
            version: 1,
            liked_cells: BTreeSet::new(),
            history,
            indicator_color: None,
        }
    }

    /// Alive and awake.
    pub fn is_active(&self) -> bool {
        self.is_alive && self.status == CellStatus::Active
    }
}
