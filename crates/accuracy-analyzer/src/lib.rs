//! Move-accuracy scoring of a single player against an evaluation engine.

pub mod analysis;
pub mod analyzer;
pub mod engine;
pub mod error;
pub mod stockfish;

pub use analysis::{classify, AccuracyReport, MoveQuality, Thresholds};
pub use analyzer::{analyze_game, GameAnalysis};
pub use engine::Evaluator;
pub use error::{AnalysisError, EngineError};
pub use shakmaty::Color;
pub use stockfish::{EngineOptions, StockfishEngine};
