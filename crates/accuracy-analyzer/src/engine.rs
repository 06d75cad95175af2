use async_trait::async_trait;

use crate::error::EngineError;

/// A stateful position evaluator.
///
/// The evaluator holds the current game position itself: it is reset to the
/// standard start, moves are pushed one at a time, and `evaluate` scores the
/// resulting position. An instance belongs to one game at a time.
#[async_trait]
pub trait Evaluator: Send {
    /// Forget the previous game and return to the standard starting position.
    async fn set_start_position(&mut self) -> Result<(), EngineError>;

    /// Play a move given in UCI notation from the current position.
    async fn apply_move(&mut self, uci_move: &str) -> Result<(), EngineError>;

    /// Centipawn score of the current position from White's point of view.
    async fn evaluate(&mut self) -> Result<i32, EngineError>;
}
