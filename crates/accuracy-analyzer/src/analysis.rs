//! Move classification and accuracy arithmetic. No engine or board access.

use serde::{Deserialize, Serialize};

/// Centipawn loss strictly below this is a perfect move
pub const PERFECT_MAX_CP_LOSS: i32 = 30;

/// Centipawn loss strictly above this is a mistake
pub const MISTAKE_MIN_CP_LOSS: i32 = 100;

/// Classification boundaries (centipawn loss)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thresholds {
    pub perfect_below: i32,
    pub mistake_above: i32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            perfect_below: PERFECT_MAX_CP_LOSS,
            mistake_above: MISTAKE_MIN_CP_LOSS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveQuality {
    Perfect,
    Decent,
    Mistake,
}

pub fn classify(cp_loss: i32, thresholds: &Thresholds) -> MoveQuality {
    if cp_loss < thresholds.perfect_below {
        MoveQuality::Perfect
    } else if cp_loss > thresholds.mistake_above {
        MoveQuality::Mistake
    } else {
        MoveQuality::Decent
    }
}

/// Centipawn loss of a move, given White-relative scores before and after it.
pub fn centipawn_loss(before: i32, after: i32, mover_is_white: bool) -> i32 {
    let sign = if mover_is_white { 1 } else { -1 };
    (before - after) * sign
}

/// Per-game move counts for the tracked side.
///
/// `accuracy` stays at the `0.0` sentinel until at least one move was
/// classified.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    pub perfect_moves: u32,
    pub decent_moves: u32,
    pub mistakes: u32,
    pub accuracy: f64,
}

impl AccuracyReport {
    pub fn played_moves(&self) -> u32 {
        self.perfect_moves + self.decent_moves + self.mistakes
    }

    pub fn is_empty(&self) -> bool {
        self.played_moves() == 0
    }

    pub fn record(&mut self, quality: MoveQuality) {
        match quality {
            MoveQuality::Perfect => self.perfect_moves += 1,
            MoveQuality::Decent => self.decent_moves += 1,
            MoveQuality::Mistake => self.mistakes += 1,
        }
    }

    /// Recompute `accuracy` from the counters (rounded to two decimals).
    pub fn finish(&mut self) {
        let played = self.played_moves();
        if played == 0 {
            self.accuracy = 0.0;
            return;
        }
        let score = self.perfect_moves as f64 + self.decent_moves as f64 * 0.5;
        self.accuracy = round2(score / played as f64 * 100.0);
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
