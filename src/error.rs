use thiserror::Error;

use crate::types::Position;

/// Rejections from the turn-resolution protocol. None of them mutate the round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TurnError {
    #[error("position {requested} is not reachable from {from}")]
    InvalidMove { from: Position, requested: Position },

    #[error("an encounter is waiting for a respawn choice")]
    EncounterPending,

    #[error("no encounter is waiting for a respawn choice")]
    NoPendingEncounter,

    #[error("the round is already over")]
    RoundOver,
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported stats file version {0}")]
    UnsupportedVersion(u8),
}
