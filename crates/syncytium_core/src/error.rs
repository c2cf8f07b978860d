use syncytium_data::CellId;
use thiserror::Error;

/// Errors surfaced by the network facade.
///
/// Domain-expected degenerate cases (capacity exhaustion, unreachable
/// targets, collaborator failures) never appear here; they resolve to
/// fallback outcomes instead. Only calls that cannot produce a valid state
/// transition at all fail.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("unknown cell: {0}")]
    UnknownCell(CellId),

    #[error("cell {0} is dead")]
    DeadCell(CellId),

    #[error("purpose must not be empty")]
    EmptyPurpose,
}
