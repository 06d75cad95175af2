#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use accuracy_analyzer::{EngineError, Evaluator};
use arena_check::clients::{Accept, HttpResponse, StatusCode, Transport, TransportError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;

pub const BASE_URL: &str = "https://lichess.test/api";
pub const SITE_URL: &str = "https://lichess.test";

// ---------------------------------------------------------------------------
// Scripted HTTP
// ---------------------------------------------------------------------------

/// One canned answer to a GET.
#[derive(Debug, Clone)]
pub enum Reply {
    /// Status plus body chunks, sent as-is
    Body(u16, Vec<String>),
    /// Status plus chunks, then a transport error mid-body
    Broken(u16, Vec<String>),
    Timeout,
    Refused,
}

impl Reply {
    pub fn ok(body: &str) -> Self {
        Reply::Body(200, vec![body.to_string()])
    }

    pub fn status(code: u16) -> Self {
        Reply::Body(code, Vec::new())
    }

    pub fn ndjson(lines: &[String]) -> Self {
        Reply::Body(200, lines.iter().map(|l| format!("{l}\n")).collect())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    pub url: String,
    pub query: Vec<(String, String)>,
    pub accept: Accept,
}

impl Request {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct Script {
    /// (url suffix, replies in order)
    routes: Vec<(String, VecDeque<Reply>)>,
    requests: Vec<Request>,
}

/// `Transport` that answers from per-route queues and logs every request.
///
/// A route matches when the request URL ends with its suffix and, for
/// `route_for`, the `player` query parameter equals the given name.
/// Unmatched or drained routes answer 404.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, suffix: &str, replies: Vec<Reply>) -> &Self {
        self.script
            .lock()
            .unwrap()
            .routes
            .push((suffix.to_string(), replies.into()));
        self
    }

    pub fn route_for(&self, suffix: &str, player: &str, replies: Vec<Reply>) -> &Self {
        self.route(&format!("{suffix}?player={player}"), replies)
    }

    pub fn requests(&self) -> Vec<Request> {
        self.script.lock().unwrap().requests.clone()
    }

    pub fn calls_to(&self, suffix: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.url.ends_with(suffix))
            .count()
    }

    fn next_reply(&self, url: &str, query: &[(&str, String)]) -> Option<Reply> {
        let player = query
            .iter()
            .find(|(k, _)| *k == "player")
            .map(|(_, v)| v.as_str());
        let mut script = self.script.lock().unwrap();

        script.routes.iter_mut().find_map(|(key, replies)| {
            let matched = match key.split_once("?player=") {
                Some((suffix, name)) => url.ends_with(suffix) && player == Some(name),
                None => url.ends_with(key.as_str()),
            };
            if matched {
                replies.pop_front()
            } else {
                None
            }
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(
        &self,
        url: &str,
        query: &[(&str, String)],
        accept: Accept,
    ) -> Result<HttpResponse, TransportError> {
        self.script.lock().unwrap().requests.push(Request {
            url: url.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            accept,
        });

        let (code, chunks, broken) = match self.next_reply(url, query) {
            Some(Reply::Body(code, chunks)) => (code, chunks, false),
            Some(Reply::Broken(code, chunks)) => (code, chunks, true),
            Some(Reply::Timeout) => return Err(TransportError::Timeout),
            Some(Reply::Refused) => {
                return Err(TransportError::Request("connection refused".into()))
            }
            None => (404, Vec::new(), false),
        };

        let mut items: Vec<Result<Bytes, TransportError>> =
            chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
        if broken {
            items.push(Err(TransportError::Request("connection reset".into())));
        }

        Ok(HttpResponse {
            status: StatusCode::from_u16(code).unwrap(),
            body: futures::stream::iter(items).boxed(),
        })
    }
}

// ---------------------------------------------------------------------------
// Lichess payloads
// ---------------------------------------------------------------------------

pub fn result_line(rank: u32, username: &str) -> String {
    format!(r#"{{"rank":{rank},"score":{},"rating":2400,"username":"{username}"}}"#, 100 - rank)
}

pub fn game_line(id: &str, white: &str, black: &str, moves: &str) -> String {
    format!(
        r#"{{"id":"{id}","rated":true,"variant":"standard","speed":"blitz","moves":"{moves}","players":{{"white":{{"user":{{"name":"{white}","id":"{}"}},"rating":2500}},"black":{{"user":{{"name":"{black}","id":"{}"}},"rating":2480}}}}}}"#,
        white.to_lowercase(),
        black.to_lowercase()
    )
}

// ---------------------------------------------------------------------------
// Engines
// ---------------------------------------------------------------------------

/// Scores every position with `score(moves played so far)`.
pub struct ScriptedEngine<F> {
    score: F,
    moves: Vec<String>,
    /// Number of `set_start_position` calls
    pub games: usize,
}

impl<F> ScriptedEngine<F>
where
    F: Fn(&[String]) -> i32 + Send,
{
    pub fn new(score: F) -> Self {
        Self {
            score,
            moves: Vec::new(),
            games: 0,
        }
    }
}

#[async_trait]
impl<F> Evaluator for ScriptedEngine<F>
where
    F: Fn(&[String]) -> i32 + Send,
{
    async fn set_start_position(&mut self) -> Result<(), EngineError> {
        self.moves.clear();
        self.games += 1;
        Ok(())
    }

    async fn apply_move(&mut self, uci: &str) -> Result<(), EngineError> {
        self.moves.push(uci.to_string());
        Ok(())
    }

    async fn evaluate(&mut self) -> Result<i32, EngineError> {
        Ok((self.score)(&self.moves))
    }
}

/// Level position until White plays f2f3, which costs White 200cp for good.
pub fn punishes_f3(moves: &[String]) -> i32 {
    if moves.iter().any(|m| m == "f2f3") {
        -200
    } else {
        0
    }
}

pub fn engine() -> ScriptedEngine<fn(&[String]) -> i32> {
    ScriptedEngine::new(punishes_f3 as fn(&[String]) -> i32)
}

// ---------------------------------------------------------------------------
// Local HTTP server
// ---------------------------------------------------------------------------

/// Accept one connection on a local port, answer it with `body` as NDJSON
/// and hand back the raw request head. Returns the server's base URL.
pub async fn serve_once(body: &str) -> (String, tokio::task::JoinHandle<String>) {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let body = body.to_string();

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut head = Vec::new();
        let mut buf = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            head.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/x-ndjson\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&head).into_owned()
    });

    (format!("http://{addr}/api"), handle)
}

/// Header value from a raw request head, header names compared case-insensitively.
pub fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim())
    })
}
