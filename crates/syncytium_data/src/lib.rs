//! Core data structures for the Syncytium simulation.

pub mod data;

pub use data::cell::{Cell, CellId, CellStatus, Position};
pub use data::history::{CellHistory, HistoryEntry, HistoryKind, HISTORY_CAP};
pub use data::message::{Endpoint, Message};
pub use data::snapshot::NetworkSnapshot;
