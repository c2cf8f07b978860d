//! Plain serde-derived types shared across the workspace.

pub mod cell;
pub mod history;
pub mod message;
pub mod snapshot;
