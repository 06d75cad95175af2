//! HTTP GET transport. The client talks to this trait so tests can script
//! responses without a network.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::Client;
pub use reqwest::StatusCode;
use thiserror::Error;

pub type BodyStream = BoxStream<'static, Result<Bytes, TransportError>>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("{0}")]
    Request(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// Expected response body format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accept {
    Json,
    NdJson,
}

impl Accept {
    pub fn mime(self) -> &'static str {
        match self {
            Accept::Json => "application/json",
            Accept::NdJson => "application/x-ndjson",
        }
    }
}

pub struct HttpResponse {
    pub status: StatusCode,
    pub body: BodyStream,
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        accept: Accept,
    ) -> Result<HttpResponse, TransportError>;
}

/// `reqwest` transport with a fixed User-Agent and timeouts
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        // Per-read rather than total timeout so long game streams can finish
        let client = Client::builder()
            .user_agent(user_agent)
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        accept: Accept,
    ) -> Result<HttpResponse, TransportError> {
        let resp = self
            .client
            .get(url)
            .query(query)
            .header("Accept", accept.mime())
            .send()
            .await?;

        Ok(HttpResponse {
            status: resp.status(),
            body: resp
                .bytes_stream()
                .map(|chunk| chunk.map_err(TransportError::from))
                .boxed(),
        })
    }
}
