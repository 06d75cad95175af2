//! Newline-delimited JSON decoding over a response body stream.
//!
//! Decoding never aborts: blank lines are skipped, undecodable lines are
//! reported and skipped, and a transport error ends the stream after
//! everything decoded so far has been yielded.

use std::fmt::Display;

use async_stream::stream;
use bytes::{Bytes, BytesMut};
use futures::{Stream, StreamExt};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// One non-blank line of the body.
#[derive(Debug, Clone, PartialEq)]
pub enum Line<T> {
    Record(T),
    Malformed { text: String, error: String },
}

/// Decode every non-blank line of `body`.
///
/// The body is owned by the returned stream and dropped when the stream
/// finishes or is dropped itself.
pub fn lines<T, S, E>(body: S) -> impl Stream<Item = Line<T>>
where
    T: DeserializeOwned,
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    stream! {
        let mut body = Box::pin(body);
        let mut buf = BytesMut::new();

        loop {
            match body.next().await {
                Some(Ok(chunk)) => {
                    buf.extend_from_slice(&chunk);
                    while let Some(end) = buf.iter().position(|b| *b == b'\n') {
                        let line = buf.split_to(end + 1);
                        if let Some(item) = decode_line::<T>(&line[..end]) {
                            yield item;
                        }
                    }
                }
                Some(Err(e)) => {
                    // A partial trailing line is dropped with the body
                    warn!(error = %e, "Error reading stream response");
                    break;
                }
                None => {
                    if let Some(item) = decode_line::<T>(&buf) {
                        yield item;
                    }
                    break;
                }
            }
        }

        drop(body);
        debug!("Response body released");
    }
}

/// Decoded records only; malformed lines are logged and skipped.
pub fn records<T, S, E>(body: S) -> impl Stream<Item = T>
where
    T: DeserializeOwned,
    S: Stream<Item = Result<Bytes, E>>,
    E: Display,
{
    lines(body).filter_map(|line| async move {
        match line {
            Line::Record(record) => Some(record),
            Line::Malformed { text, error } => {
                warn!(%error, line = %text, "Could not decode JSON line");
                None
            }
        }
    })
}

fn decode_line<T: DeserializeOwned>(raw: &[u8]) -> Option<Line<T>> {
    let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
    if raw.iter().all(u8::is_ascii_whitespace) {
        return None;
    }

    Some(match serde_json::from_slice(raw) {
        Ok(record) => Line::Record(record),
        Err(e) => Line::Malformed {
            text: String::from_utf8_lossy(raw).into_owned(),
            error: e.to_string(),
        },
    })
}
