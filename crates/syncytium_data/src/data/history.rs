use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum retained entries per cell. Oldest are evicted first.
pub const HISTORY_CAP: usize = 100;

/// Classification of one recorded state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryKind {
    Init,
    Death,
    Sleep,
    Wake,
    StayAwake,
    SelfCheck,
    Clone,
    Sent,
    Received,
    RouteBroken,
    HelpRequested,
    HelpOffered,
    Liked,
    Unliked,
    Work,
    Repaired,
}

/// One immutable, sequenced record of a state-changing event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub seq: u64,
    pub kind: HistoryKind,
    pub age: u32,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// Append-only bounded event record. `seq` is strictly increasing per cell
/// and never reused, even across eviction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CellHistory {
    next_seq: u64,
    entries: VecDeque<HistoryEntry>,
}

impl CellHistory {
    pub fn record(&mut self, kind: HistoryKind, age: u32, text: impl Into<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.push_back(HistoryEntry {
            seq,
            kind,
            age,
            text: text.into(),
            timestamp: Utc::now(),
        });
        while self.entries.len() > HISTORY_CAP {
            self.entries.pop_front();
        }
        seq
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    /// Most-recent-first walk over the newest `n` entries.
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev().take(n)
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when `seq` is strictly increasing front to back and the next
    /// assignable sequence number is past every stored one.
    pub fn is_consistent(&self) -> bool {
        let ordered = self
            .entries
            .iter()
            .zip(self.entries.iter().skip(1))
            .all(|(a, b)| a.seq < b.seq);
        ordered && self.entries.back().is_none_or(|e| e.seq < self.next_seq)
    }

    /// Defensive in-place repair: re-sorts entries, drops duplicate
    /// sequence numbers, and advances `next_seq` past the stored maximum.
    pub fn rebuild(&mut self) {
        let mut entries: Vec<HistoryEntry> = self.entries.drain(..).collect();
        entries.sort_by_key(|e| e.seq);
        entries.dedup_by_key(|e| e.seq);
        let max_seq = entries.last().map(|e| e.seq);
        self.entries = entries.into();
        if let Some(max) = max_seq {
            self.next_seq = self.next_seq.max(max + 1);
        }
    }
}
