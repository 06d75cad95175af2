//! Analyzer error types

use chess_core::NotationError;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Engine protocol error: {0}")]
    Protocol(String),

    #[error("Engine timed out after {0}s")]
    Timeout(u64),
}

/// Reason a game replay stopped early.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AnalysisError {
    #[error("Move {ply}: {source}")]
    Notation {
        ply: usize,
        #[source]
        source: NotationError,
    },

    #[error("Move {ply}: {source}")]
    Engine {
        ply: usize,
        #[source]
        source: EngineError,
    },
}
