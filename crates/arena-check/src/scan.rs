//! Tournament scan: fetch the top players, fetch each player's games and
//! flag the games whose accuracy reaches the threshold.

use std::time::Duration;

use accuracy_analyzer::{analyze_game, Color, Evaluator, GameAnalysis, Thresholds};
use chess_core::GameRecord;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::backoff::{self, API_DELAY};
use crate::clients::{LichessClient, Transport};
use crate::error::{ApiError, ScanError};
use crate::events::{ScanEvent, ScanObserver, Side};

pub const LICHESS_SITE_URL: &str = "https://lichess.org";

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub tournament_id: String,
    /// Accuracy (percent) at or above which a game is flagged
    pub threshold: f64,
    pub top_n: usize,
}

impl ScanRequest {
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.tournament_id.is_empty()
            || !self.tournament_id.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ScanError::InvalidRequest(format!(
                "tournament id '{}' must be alphanumeric",
                self.tournament_id
            )));
        }
        if !self.threshold.is_finite() {
            return Err(ScanError::InvalidRequest("threshold must be a number".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlaggedGame {
    pub username: String,
    pub game_id: String,
    pub link: String,
    pub side: Side,
    pub accuracy: f64,
    pub perfect_moves: u32,
    pub decent_moves: u32,
    pub mistakes: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    pub tournament_id: String,
    pub threshold: f64,
    pub players_scanned: Vec<String>,
    pub games_analyzed: usize,
    pub flagged: Vec<FlaggedGame>,
    pub players_without_flags: Vec<String>,
    pub players_without_games: Vec<String>,
    pub skipped_games: usize,
    pub failed_analyses: usize,
    pub cancelled: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ScanSummary {
    fn new(request: &ScanRequest) -> Self {
        Self {
            tournament_id: request.tournament_id.clone(),
            threshold: request.threshold,
            players_scanned: Vec::new(),
            games_analyzed: 0,
            flagged: Vec::new(),
            players_without_flags: Vec::new(),
            players_without_games: Vec::new(),
            skipped_games: 0,
            failed_analyses: 0,
            cancelled: false,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn any_flagged(&self) -> bool {
        !self.flagged.is_empty()
    }

    fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }
}

/// One evaluator per worker. A worker locks its evaluator for a whole game.
pub struct EnginePool<E> {
    engines: Vec<Mutex<E>>,
}

impl<E: Evaluator> EnginePool<E> {
    pub fn new(engines: Vec<E>) -> Self {
        Self {
            engines: engines.into_iter().map(Mutex::new).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn into_engines(self) -> Vec<E> {
        self.engines.into_iter().map(Mutex::into_inner).collect()
    }

    async fn analyze(
        &self,
        slot: usize,
        game: &GameRecord,
        color: Color,
        thresholds: &Thresholds,
    ) -> GameAnalysis {
        let mut engine = self.engines[slot % self.engines.len()].lock().await;
        analyze_game(&mut *engine, &game.moves, color, thresholds).await
    }
}

pub struct Scanner<T, E> {
    client: LichessClient<T>,
    engines: EnginePool<E>,
    thresholds: Thresholds,
    api_delay: Duration,
    site_url: String,
    cancel: CancellationToken,
}

impl<T: Transport, E: Evaluator> Scanner<T, E> {
    pub fn new(client: LichessClient<T>, engines: EnginePool<E>, cancel: CancellationToken) -> Self {
        Self {
            client,
            engines,
            thresholds: Thresholds::default(),
            api_delay: API_DELAY,
            site_url: LICHESS_SITE_URL.to_string(),
            cancel,
        }
    }

    pub fn with_thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn with_site_url(mut self, site_url: &str) -> Self {
        self.site_url = site_url.trim_end_matches('/').to_string();
        self
    }

    /// Delay before each player's games request
    pub fn with_api_delay(mut self, delay: Duration) -> Self {
        self.api_delay = delay;
        self
    }

    pub fn into_engines(self) -> Vec<E> {
        self.engines.into_engines()
    }

    /// Run one scan. API calls are made one at a time; games of a player
    /// are analysed on up to `EnginePool::len` evaluators at once.
    ///
    /// Cancellation returns the partial summary with `cancelled` set.
    /// Exhausted API retries are returned as an error.
    pub async fn run(
        &self,
        request: &ScanRequest,
        observer: &mut dyn ScanObserver,
    ) -> Result<ScanSummary, ScanError> {
        request.validate()?;
        if self.engines.is_empty() {
            return Err(ScanError::InvalidRequest("no evaluation engines".into()));
        }

        let mut summary = ScanSummary::new(request);

        let players = match self
            .client
            .top_players(&request.tournament_id, request.top_n)
            .await
        {
            Ok(players) => players,
            Err(ApiError::Cancelled) => return Ok(cancelled(summary, observer)),
            Err(e) => return Err(e.into()),
        };

        if players.is_empty() {
            observer.on_event(&ScanEvent::NothingToScan);
            return Ok(summary.finish());
        }
        observer.on_event(&ScanEvent::RankingFetched {
            players: players.clone(),
        });

        for username in players {
            if backoff::pause(self.api_delay, &self.cancel).await.is_err() {
                return Ok(cancelled(summary, observer));
            }

            let games = match self
                .client
                .player_games(&request.tournament_id, &username)
                .await
            {
                Ok(games) => games,
                Err(ApiError::Cancelled) => return Ok(cancelled(summary, observer)),
                Err(e) => return Err(e.into()),
            };
            summary.players_scanned.push(username.clone());

            if games.is_empty() {
                observer.on_event(&ScanEvent::NoGames {
                    username: username.clone(),
                });
                summary.players_without_games.push(username);
                continue;
            }
            observer.on_event(&ScanEvent::GamesFetched {
                username: username.clone(),
                games: games.len(),
            });

            let flagged_before = summary.flagged.len();
            if !self
                .scan_games(&username, games, request.threshold, &mut summary, observer)
                .await
            {
                return Ok(cancelled(summary, observer));
            }

            if summary.flagged.len() == flagged_before {
                observer.on_event(&ScanEvent::NoFlaggedGames {
                    username: username.clone(),
                    threshold: request.threshold,
                });
                summary.players_without_flags.push(username);
            }
        }

        info!(
            players = summary.players_scanned.len(),
            games = summary.games_analyzed,
            flagged = summary.flagged.len(),
            "Scan finished"
        );
        Ok(summary.finish())
    }

    /// Analyse one player's games in order. Returns false when cancelled.
    async fn scan_games(
        &self,
        username: &str,
        games: Vec<GameRecord>,
        threshold: f64,
        summary: &mut ScanSummary,
        observer: &mut dyn ScanObserver,
    ) -> bool {
        let engines = &self.engines;
        let thresholds = &self.thresholds;

        let results = futures::stream::iter(games.into_iter().enumerate())
            .map(move |(slot, game)| async move {
                let analysis = match game.side_of(username) {
                    Some(color) => Some((color, engines.analyze(slot, &game, color, thresholds).await)),
                    None => None,
                };
                (game, analysis)
            })
            .buffered(engines.len());
        futures::pin_mut!(results);

        loop {
            let next = tokio::select! {
                _ = self.cancel.cancelled() => return false,
                next = results.next() => next,
            };
            let Some((game, analysis)) = next else {
                return true;
            };

            let Some((color, analysis)) = analysis else {
                summary.skipped_games += 1;
                observer.on_event(&ScanEvent::GameSkipped {
                    username: username.to_string(),
                    game_id: game.id,
                    white: game.white,
                    black: game.black,
                });
                continue;
            };

            let report = analysis.report;
            let flagged = !report.is_empty() && report.accuracy >= threshold;
            let link = format!("{}/{}", self.site_url, game.id);

            summary.games_analyzed += 1;
            if analysis.failure.is_some() {
                summary.failed_analyses += 1;
            }
            if flagged {
                summary.flagged.push(FlaggedGame {
                    username: username.to_string(),
                    game_id: game.id.clone(),
                    link: link.clone(),
                    side: color.into(),
                    accuracy: report.accuracy,
                    perfect_moves: report.perfect_moves,
                    decent_moves: report.decent_moves,
                    mistakes: report.mistakes,
                });
            }

            observer.on_event(&ScanEvent::GameAnalyzed {
                username: username.to_string(),
                game_id: game.id,
                link,
                side: color.into(),
                report,
                flagged,
                failure: analysis.failure.map(|e| e.to_string()),
            });
        }
    }
}

fn cancelled(mut summary: ScanSummary, observer: &mut dyn ScanObserver) -> ScanSummary {
    observer.on_event(&ScanEvent::Cancelled);
    summary.cancelled = true;
    summary.finish()
}
