//! Integration tests: game analysis through the public analyzer API.

mod common;

use accuracy_analyzer::{analyze_game, AccuracyReport, AnalysisError, Color, Thresholds};
use common::{engine, ScriptedEngine};

const SCHOLARS_MATE: &str = "e4 e5 Bc4 Nc6 Qh5 Nf6 Qxf7# 1-0";

#[tokio::test]
async fn test_same_game_same_report() {
    let mut engine = engine();
    let thresholds = Thresholds::default();

    let first = analyze_game(&mut engine, SCHOLARS_MATE, Color::White, &thresholds).await;
    let second = analyze_game(&mut engine, SCHOLARS_MATE, Color::White, &thresholds).await;

    assert!(first.is_complete());
    assert_eq!(first.report, second.report);
    assert_eq!(first.report.perfect_moves, 4);
    assert_eq!(first.report.accuracy, 100.0);
    assert_eq!(engine.games, 2);
}

#[tokio::test]
async fn test_swing_classification_per_side() {
    // +120 for White once the queen lands on f7
    let mut engine = ScriptedEngine::new(|moves: &[String]| {
        if moves.iter().any(|m| m == "h5f7") {
            120
        } else {
            0
        }
    });
    let thresholds = Thresholds::default();

    let white = analyze_game(&mut engine, SCHOLARS_MATE, Color::White, &thresholds).await;
    assert_eq!(white.report.perfect_moves, 4);

    // Black only moves before the swing
    let black = analyze_game(&mut engine, SCHOLARS_MATE, Color::Black, &thresholds).await;
    assert_eq!(black.report.played_moves(), 3);
    assert_eq!(black.report.mistakes, 0);
}

#[tokio::test]
async fn test_decent_band() {
    // f3 costs 50cp: neither perfect nor a mistake
    let mut engine = ScriptedEngine::new(|moves: &[String]| {
        if moves.iter().any(|m| m == "f2f3") {
            -50
        } else {
            0
        }
    });

    let result = analyze_game(&mut engine, "f3 e5 e4", Color::White, &Thresholds::default()).await;

    assert_eq!(
        result.report,
        AccuracyReport {
            perfect_moves: 1,
            decent_moves: 1,
            mistakes: 0,
            accuracy: 75.0,
        }
    );
}

#[tokio::test]
async fn test_no_tracked_moves_is_sentinel() {
    let mut engine = engine();

    let result = analyze_game(&mut engine, "e4", Color::Black, &Thresholds::default()).await;

    assert!(result.is_complete());
    assert!(result.report.is_empty());
    assert_eq!(result.report.accuracy, 0.0);
}

#[tokio::test]
async fn test_garbage_token_stops_with_partial_report() {
    let mut engine = engine();

    let result = analyze_game(&mut engine, "e4 e5 Zz9 Nc6", Color::White, &Thresholds::default()).await;

    assert_eq!(result.report.perfect_moves, 1);
    assert!(matches!(
        result.failure,
        Some(AnalysisError::Notation { ply: 3, .. })
    ));
}
