//! Shared chess types: tournament game records and SAN move replay.

pub mod game_data;
pub mod notation;

pub use game_data::{GameRecord, LichessGame};
pub use notation::{move_tokens, MoveReplay, NotationError};
