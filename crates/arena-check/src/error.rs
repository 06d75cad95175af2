//! Client and scan error types

use thiserror::Error;

use crate::backoff::Failure;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("API request for endpoint '{endpoint}' failed {attempts} times, last error: {last_error}")]
    RetriesExhausted {
        endpoint: String,
        attempts: u32,
        last_error: Failure,
    },

    #[error("API request cancelled")]
    Cancelled,

    #[error("HTTP client setup failed: {0}")]
    Client(String),
}

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid scan request: {0}")]
    InvalidRequest(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}
