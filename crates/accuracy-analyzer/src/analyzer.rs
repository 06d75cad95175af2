//! Replays a game against an evaluator and scores one side's moves.

use chess_core::{move_tokens, MoveReplay};
use shakmaty::Color;
use tracing::{debug, warn};

use crate::analysis::{self, AccuracyReport, Thresholds};
use crate::engine::Evaluator;
use crate::error::AnalysisError;

/// Outcome of analysing one game. `report` is always usable; when `failure`
/// is set it only covers the moves before the replay stopped.
#[derive(Debug, Clone, PartialEq)]
pub struct GameAnalysis {
    pub report: AccuracyReport,
    pub failure: Option<AnalysisError>,
}

impl GameAnalysis {
    pub fn is_complete(&self) -> bool {
        self.failure.is_none()
    }
}

/// Analyze the moves of `tracked` in a space-separated SAN move text.
///
/// Never fails: an illegal move or an engine error stops the replay and is
/// returned next to the report accumulated so far.
pub async fn analyze_game<E: Evaluator + ?Sized>(
    engine: &mut E,
    moves: &str,
    tracked: Color,
    thresholds: &Thresholds,
) -> GameAnalysis {
    let mut report = AccuracyReport::default();

    let failure = replay(engine, moves, tracked, thresholds, &mut report)
        .await
        .err();
    if let Some(e) = &failure {
        warn!(error = %e, moves, "Game analysis aborted");
    }

    report.finish();
    GameAnalysis { report, failure }
}

async fn replay<E: Evaluator + ?Sized>(
    engine: &mut E,
    moves: &str,
    tracked: Color,
    thresholds: &Thresholds,
    report: &mut AccuracyReport,
) -> Result<(), AnalysisError> {
    engine
        .set_start_position()
        .await
        .map_err(|source| AnalysisError::Engine { ply: 0, source })?;

    let mut board = MoveReplay::new();

    for (i, token) in move_tokens(moves).enumerate() {
        let ply = i + 1;
        let mover = board.turn();
        let engine_err = |source| AnalysisError::Engine { ply, source };

        if mover != tracked {
            let uci = board
                .apply_san(token)
                .map_err(|source| AnalysisError::Notation { ply, source })?;
            engine.apply_move(&uci).await.map_err(engine_err)?;
            continue;
        }

        // Validate locally first; the engine still holds the position before the move
        let uci = board
            .apply_san(token)
            .map_err(|source| AnalysisError::Notation { ply, source })?;
        let before = engine.evaluate().await.map_err(engine_err)?;
        engine.apply_move(&uci).await.map_err(engine_err)?;
        let after = engine.evaluate().await.map_err(engine_err)?;

        let cp_loss = analysis::centipawn_loss(before, after, mover == Color::White);
        let quality = analysis::classify(cp_loss, thresholds);
        debug!(ply, token, before, after, cp_loss, ?quality, "Move classified");
        report.record(quality);
    }

    Ok(())
}
