//! Syncytium: a simulated network of autonomous cell agents.
//!
//! Thin facade over the workspace crates; the engine lives in
//! `syncytium_core`, shared types in `syncytium_data`, and the reasoning
//! collaborators in `syncytium_observer`.

pub use syncytium_core::{
    config, init_logging, DeliveryMode, HelpOutcome, Metrics, Network, NetworkError, SendOutcome,
    SimConfig,
};
pub use syncytium_data::{
    Cell, CellHistory, CellId, CellStatus, Endpoint, HistoryEntry, HistoryKind, Message,
    NetworkSnapshot, Position, HISTORY_CAP,
};
pub use syncytium_observer as observer;
