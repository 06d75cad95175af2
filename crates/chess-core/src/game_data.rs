use serde::{Deserialize, Serialize};
use shakmaty::Color;

/// A tournament game reduced to what the accuracy scan needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub id: String,
    pub moves: String, // space-separated SAN
    pub white: String,
    pub black: String,
}

impl GameRecord {
    /// Which colour `username` played, compared case-insensitively.
    /// `None` when the user is not one of the recorded participants.
    pub fn side_of(&self, username: &str) -> Option<Color> {
        if username.is_empty() {
            return None;
        }
        if self.white.eq_ignore_ascii_case(username) {
            Some(Color::White)
        } else if self.black.eq_ignore_ascii_case(username) {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn player(&self, color: Color) -> &str {
        match color {
            Color::White => &self.white,
            Color::Black => &self.black,
        }
    }
}

/// Game object as streamed by the Lichess tournament games export
/// (`moves=true`). Only the fields the scanner reads are modelled.
#[derive(Debug, Clone, Deserialize)]
pub struct LichessGame {
    pub id: String,
    #[serde(default)]
    pub moves: String,
    #[serde(default)]
    pub players: GamePlayers,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GamePlayers {
    #[serde(default)]
    pub white: GamePlayer,
    #[serde(default)]
    pub black: GamePlayer,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GamePlayer {
    /// Absent for anonymous players and engine opponents
    pub user: Option<LightUser>,
    pub rating: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LightUser {
    pub name: String,
    pub title: Option<String>,
}

impl GamePlayer {
    fn name(&self) -> String {
        self.user
            .as_ref()
            .map(|u| u.name.clone())
            .unwrap_or_default()
    }
}

impl From<LichessGame> for GameRecord {
    fn from(game: LichessGame) -> Self {
        Self {
            white: game.players.white.name(),
            black: game.players.black.name(),
            id: game.id,
            moves: game.moves,
        }
    }
}
