//! SAN move replay backed by shakmaty.
//!
//! Turns the move text of a game into the UCI moves an engine understands,
//! validating legality against the replayed position along the way.

use shakmaty::san::SanPlus;
use shakmaty::{CastlingMode, Chess, Color, Position};
use thiserror::Error;

const RESULT_MARKERS: [&str; 4] = ["1-0", "0-1", "1/2-1/2", "*"];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotationError {
    #[error("Invalid SAN '{token}': {reason}")]
    InvalidSan { token: String, reason: String },

    #[error("Illegal move '{token}': {reason}")]
    IllegalMove { token: String, reason: String },
}

/// Split a move text into SAN tokens, ignoring extra whitespace and
/// trailing result markers.
pub fn move_tokens(moves: &str) -> impl Iterator<Item = &str> {
    moves
        .split_whitespace()
        .filter(|t| !RESULT_MARKERS.contains(t))
}

/// A position being replayed from the standard start.
#[derive(Debug, Clone, Default)]
pub struct MoveReplay {
    pos: Chess,
}

impl MoveReplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Side to move in the replayed position.
    pub fn turn(&self) -> Color {
        self.pos.turn()
    }

    /// Apply one SAN token and return the move in UCI notation.
    /// The position is left untouched when the token is rejected.
    pub fn apply_san(&mut self, token: &str) -> Result<String, NotationError> {
        let san: SanPlus = token.parse().map_err(|e| NotationError::InvalidSan {
            token: token.to_string(),
            reason: format!("{e}"),
        })?;

        let mv = san
            .san
            .to_move(&self.pos)
            .map_err(|e| NotationError::IllegalMove {
                token: token.to_string(),
                reason: format!("{e}"),
            })?;

        let uci = mv.to_uci(CastlingMode::Standard).to_string();
        self.pos.play_unchecked(mv);
        Ok(uci)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_san_returns_uci() {
        let mut replay = MoveReplay::new();
        let uci: Vec<String> = ["e4", "e5", "Nf3", "Nc6", "Bc4", "Nf6", "O-O"]
            .iter()
            .map(|san| replay.apply_san(san).unwrap())
            .collect();
        assert_eq!(uci, vec!["e2e4", "e7e5", "g1f3", "b8c6", "f1c4", "g8f6", "e1g1"]);
        assert_eq!(replay.turn(), Color::Black);
    }

    #[test]
    fn test_mate_suffix() {
        let mut replay = MoveReplay::new();
        for san in ["f3", "e5", "g4"] {
            replay.apply_san(san).unwrap();
        }
        assert_eq!(replay.apply_san("Qh4#").unwrap(), "d8h4");
    }

    #[test]
    fn test_promotion_capture_with_check() {
        let mut replay = MoveReplay::new();
        for san in ["h4", "g5", "hxg5", "Nf6", "gxf6", "Rg8", "fxe7", "Bg7"] {
            replay.apply_san(san).unwrap();
        }
        assert_eq!(replay.apply_san("exd8=Q+").unwrap(), "e7d8q");
        assert_eq!(replay.turn(), Color::Black);
    }

    #[test]
    fn test_illegal_move_leaves_position() {
        let mut replay = MoveReplay::new();
        replay.apply_san("e4").unwrap();
        let err = replay.apply_san("e4").unwrap_err();
        assert!(matches!(err, NotationError::IllegalMove { .. }));
        assert_eq!(replay.turn(), Color::Black);
        assert_eq!(replay.apply_san("e5").unwrap(), "e7e5");
    }

    #[test]
    fn test_garbage_token_is_invalid_san() {
        let mut replay = MoveReplay::new();
        let err = replay.apply_san("hello").unwrap_err();
        assert!(matches!(err, NotationError::InvalidSan { .. }));
    }

    #[test]
    fn test_move_tokens() {
        let tokens: Vec<&str> = move_tokens("  e4   e5\nNf3 Nc6 1-0").collect();
        assert_eq!(tokens, vec!["e4", "e5", "Nf3", "Nc6"]);
        assert_eq!(move_tokens("").count(), 0);
    }
}
