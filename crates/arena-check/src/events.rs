//! Progress events emitted while a scan runs.

use accuracy_analyzer::{AccuracyReport, Color};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl From<Color> for Side {
    fn from(color: Color) -> Self {
        match color {
            Color::White => Side::White,
            Color::Black => Side::Black,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    RankingFetched {
        players: Vec<String>,
    },
    NothingToScan,
    GamesFetched {
        username: String,
        games: usize,
    },
    NoGames {
        username: String,
    },
    /// The player is neither White nor Black in a game listed for them
    GameSkipped {
        username: String,
        game_id: String,
        white: String,
        black: String,
    },
    GameAnalyzed {
        username: String,
        game_id: String,
        link: String,
        side: Side,
        report: AccuracyReport,
        flagged: bool,
        /// Set when the replay stopped early; `report` is then partial
        failure: Option<String>,
    },
    NoFlaggedGames {
        username: String,
        threshold: f64,
    },
    Cancelled,
}

pub trait ScanObserver {
    fn on_event(&mut self, event: &ScanEvent);
}

/// Collects events in memory
impl ScanObserver for Vec<ScanEvent> {
    fn on_event(&mut self, event: &ScanEvent) {
        self.push(event.clone());
    }
}

/// Reports every event through `tracing` as it happens
#[derive(Debug, Default)]
pub struct TracingObserver;

impl ScanObserver for TracingObserver {
    fn on_event(&mut self, event: &ScanEvent) {
        match event {
            ScanEvent::RankingFetched { players } => {
                info!(count = players.len(), ?players, "Starting player game checks");
            }
            ScanEvent::NothingToScan => {
                warn!("No players found in tournament results, nothing to scan");
            }
            ScanEvent::GamesFetched { username, games } => {
                info!(%username, games, "Checking games for player");
            }
            ScanEvent::NoGames { username } => {
                info!(%username, "No games found for player");
            }
            ScanEvent::GameSkipped {
                username,
                game_id,
                white,
                black,
            } => {
                warn!(%username, %game_id, %white, %black, "Player not found in game players, skipping");
            }
            ScanEvent::GameAnalyzed {
                username,
                link,
                side,
                report,
                flagged,
                failure,
                ..
            } => {
                if let Some(error) = failure {
                    warn!(%username, %link, %error, "Game analysis incomplete, report is partial");
                }
                if *flagged {
                    warn!(
                        %username,
                        ?side,
                        %link,
                        accuracy = report.accuracy,
                        perfect = report.perfect_moves,
                        decent = report.decent_moves,
                        mistakes = report.mistakes,
                        "** High accuracy game"
                    );
                } else {
                    info!(
                        %username,
                        ?side,
                        %link,
                        accuracy = report.accuracy,
                        perfect = report.perfect_moves,
                        decent = report.decent_moves,
                        mistakes = report.mistakes,
                        "Game analyzed"
                    );
                }
            }
            ScanEvent::NoFlaggedGames {
                username,
                threshold,
            } => {
                info!(%username, threshold, "No games found above accuracy threshold");
            }
            ScanEvent::Cancelled => {
                warn!("Scan cancelled");
            }
        }
    }
}
