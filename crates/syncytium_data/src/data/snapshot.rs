use super::cell::{Cell, CellId};
use super::message::Message;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Read-only view of the whole network, handed to renderers and tooling.
/// Removed cells leave no tombstone here.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    pub cells: BTreeMap<CellId, Cell>,
    pub messages: Vec<Message>,
    pub tick_count: u64,
    pub purpose: String,
}

impl NetworkSnapshot {
    pub fn alive_count(&self) -> usize {
        self.cells.values().filter(|c| c.is_alive).count()
    }
}
