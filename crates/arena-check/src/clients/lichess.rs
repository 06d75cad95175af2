use std::time::Duration;

use chess_core::{GameRecord, LichessGame};
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::transport::{Accept, HttpTransport, Transport, TransportError};
use crate::backoff::{self, Backoff, Failure, RetryPolicy};
use crate::error::ApiError;
use crate::ndjson;

pub const LICHESS_API_BASE_URL: &str = "https://lichess.org/api";
pub const USER_AGENT: &str = "lichess-arena-moderation-tool-v1.0";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub type RecordStream<T> = BoxStream<'static, T>;

/// One line of the arena results export
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerResult {
    pub username: Option<String>,
    pub rank: Option<u32>,
    pub score: Option<i64>,
    pub rating: Option<i32>,
}

pub struct LichessClient<T = HttpTransport> {
    transport: T,
    base_url: String,
    policy: RetryPolicy,
    cancel: CancellationToken,
}

impl LichessClient<HttpTransport> {
    pub fn new(base_url: &str, cancel: CancellationToken) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(USER_AGENT, REQUEST_TIMEOUT)
            .map_err(|e| ApiError::Client(e.to_string()))?;
        Ok(Self::with_transport(transport, base_url, cancel))
    }
}

impl<T: Transport> LichessClient<T> {
    pub fn with_transport(transport: T, base_url: &str, cancel: CancellationToken) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy: RetryPolicy::default(),
            cancel,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// GET `endpoint` and decode the body as NDJSON records.
    ///
    /// Rate limiting (429) is waited out indefinitely; other failures are
    /// retried until the policy's attempts run out, which is returned as
    /// `ApiError::RetriesExhausted`.
    pub async fn call<R>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
        accept: Accept,
    ) -> Result<RecordStream<R>, ApiError>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let url = format!("{}/{}", self.base_url, endpoint);
        let mut retry = self.policy.start();

        loop {
            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => return Err(ApiError::Cancelled),
                outcome = self.transport.get(&url, query, accept) => outcome,
            };

            let failure = match outcome {
                Ok(resp) if resp.status.is_success() => {
                    debug!(endpoint, status = %resp.status, "API response");
                    return Ok(ndjson::records(resp.body).boxed());
                }
                Ok(resp) if resp.status == StatusCode::TOO_MANY_REQUESTS => Failure::RateLimited,
                Ok(resp) => Failure::Status(resp.status),
                Err(TransportError::Timeout) => Failure::Timeout,
                Err(TransportError::Request(e)) => Failure::Transport(e),
            };

            match retry.record(&failure) {
                Backoff::Retry { after } => {
                    if failure == Failure::RateLimited {
                        warn!(
                            endpoint,
                            wait_secs = after.as_secs(),
                            "Rate limited by Lichess API, waiting before retrying"
                        );
                    } else {
                        warn!(
                            endpoint,
                            error = %failure,
                            attempt = retry.failed_attempts(),
                            wait_secs = after.as_secs(),
                            "API request failed, retrying"
                        );
                    }
                    backoff::pause(after, &self.cancel).await?;
                }
                Backoff::Exhausted { attempts } => {
                    error!(endpoint, attempts, error = %failure, "API request failed too many times");
                    return Err(ApiError::RetriesExhausted {
                        endpoint: endpoint.to_string(),
                        attempts,
                        last_error: failure,
                    });
                }
            }
        }
    }

    /// Usernames of the top `count` players of an arena, best first.
    pub async fn top_players(
        &self,
        tournament_id: &str,
        count: usize,
    ) -> Result<Vec<String>, ApiError> {
        info!(tournament_id, count, "Fetching top players");

        let endpoint = format!("tournament/{tournament_id}/results");
        let results: Vec<PlayerResult> = self
            .collect(&endpoint, &[("nb", count.to_string())])
            .await?;

        let players = results
            .into_iter()
            .filter_map(|result| {
                let username = result.username.clone().filter(|name| !name.is_empty());
                if username.is_none() {
                    warn!(?result, "Could not find username in player data");
                }
                username
            })
            .collect();
        Ok(players)
    }

    /// Games `username` played in the tournament, with moves.
    pub async fn player_games(
        &self,
        tournament_id: &str,
        username: &str,
    ) -> Result<Vec<GameRecord>, ApiError> {
        info!(tournament_id, username, "Fetching player games");

        let endpoint = format!("tournament/{tournament_id}/games");
        let query = [
            ("player", username.to_string()),
            ("moves", "true".to_string()),
        ];
        let games: Vec<LichessGame> = self.collect(&endpoint, &query).await?;
        Ok(games.into_iter().map(GameRecord::from).collect())
    }

    async fn collect<R>(&self, endpoint: &str, query: &[(&str, String)]) -> Result<Vec<R>, ApiError>
    where
        R: DeserializeOwned + Send + 'static,
    {
        let records = self.call::<R>(endpoint, query, Accept::NdJson).await?;
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ApiError::Cancelled),
            records = records.collect::<Vec<R>>() => Ok(records),
        }
    }
}
