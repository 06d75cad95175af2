//! Retry policy for API calls.
//!
//! Rate limiting and ordinary failures are handled differently: a 429 waits
//! out the cooldown and retries without spending an attempt, anything else
//! spends one of a fixed number of attempts.

use std::fmt;
use std::time::Duration;

use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;

/// Fixed delay between independent API calls and after a failed attempt
pub const API_DELAY: Duration = Duration::from_secs(2);

/// Cooldown requested by Lichess after a 429 response
pub const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Failed attempts allowed per call (rate limiting excluded)
    pub max_attempts: u32,
    pub retry_delay: Duration,
    pub rate_limit_cooldown: Duration,
    pub safety_margin: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: API_DELAY,
            rate_limit_cooldown: RATE_LIMIT_COOLDOWN,
            safety_margin: API_DELAY,
        }
    }
}

impl RetryPolicy {
    pub fn start(&self) -> RetryState<'_> {
        RetryState {
            policy: self,
            failed_attempts: 0,
            rate_limited: 0,
        }
    }
}

/// Why an attempt did not produce a usable response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    RateLimited,
    Status(StatusCode),
    Timeout,
    Transport(String),
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::RateLimited => write!(f, "rate limited (HTTP 429)"),
            Failure::Status(status) => write!(f, "HTTP {status}"),
            Failure::Timeout => write!(f, "request timed out"),
            Failure::Transport(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    Retry { after: Duration },
    Exhausted { attempts: u32 },
}

/// Attempt bookkeeping for one logical call.
#[derive(Debug)]
pub struct RetryState<'a> {
    policy: &'a RetryPolicy,
    failed_attempts: u32,
    rate_limited: u32,
}

impl RetryState<'_> {
    pub fn record(&mut self, failure: &Failure) -> Backoff {
        if *failure == Failure::RateLimited {
            self.rate_limited += 1;
            return Backoff::Retry {
                after: self.policy.rate_limit_cooldown + self.policy.safety_margin,
            };
        }

        self.failed_attempts += 1;
        if self.failed_attempts >= self.policy.max_attempts {
            Backoff::Exhausted {
                attempts: self.failed_attempts,
            }
        } else {
            Backoff::Retry {
                after: self.policy.retry_delay,
            }
        }
    }

    pub fn failed_attempts(&self) -> u32 {
        self.failed_attempts
    }

    pub fn rate_limited(&self) -> u32 {
        self.rate_limited
    }
}

/// Sleep unless cancelled first.
pub async fn pause(duration: Duration, cancel: &CancellationToken) -> Result<(), ApiError> {
    tokio::select! {
        _ = cancel.cancelled() => Err(ApiError::Cancelled),
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
