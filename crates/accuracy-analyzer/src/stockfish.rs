//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::debug;

use crate::engine::Evaluator;
use crate::error::EngineError;

/// Score assigned to a forced mate, reduced by 10 per move until mate
const MATE_SCORE: i32 = 10000;

/// Search settings applied to every evaluation
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Fixed search depth per position
    pub depth: u32,
    pub threads: u32,
    pub hash_mb: u32,
    /// Upper bound for one search or handshake
    pub timeout: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            depth: 15,
            threads: 1,
            hash_mb: 16,
            timeout: Duration::from_secs(60),
        }
    }
}

/// Result of a single search
#[derive(Debug, Clone, Default)]
struct SearchResult {
    /// Centipawn score (side to move)
    cp: Option<i32>,
    /// Mate in N moves (positive = side to move mates)
    mate: Option<i32>,
    best_move: String,
}

/// Stockfish engine instance holding the moves of the game being analysed
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    options: EngineOptions,
    moves: Vec<String>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str, options: EngineOptions) -> Result<Self, EngineError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| EngineError::Unavailable(format!("Failed to spawn {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| EngineError::Unavailable("Engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .map(BufReader::new)
            .ok_or_else(|| EngineError::Unavailable("Engine stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout,
            options,
            moves: Vec::new(),
        };

        let timeout = engine.options.timeout;
        tokio::time::timeout(timeout, engine.handshake())
            .await
            .map_err(|_| EngineError::Timeout(timeout.as_secs()))??;

        Ok(engine)
    }

    async fn handshake(&mut self) -> Result<(), EngineError> {
        self.send("uci").await?;
        self.wait_for("uciok").await?;

        self.send(&format!("setoption name Threads value {}", self.options.threads))
            .await?;
        self.send(&format!("setoption name Hash value {}", self.options.hash_mb))
            .await?;
        self.send("isready").await?;
        self.wait_for("readyok").await
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), EngineError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| EngineError::Unavailable(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| EngineError::Unavailable(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one trimmed line; EOF means the process is gone
    async fn read_line(&mut self) -> Result<String, EngineError> {
        let mut line = String::new();
        let read = self
            .stdout
            .read_line(&mut line)
            .await
            .map_err(|e| EngineError::Unavailable(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            return Err(EngineError::Unavailable("Stockfish closed its output".into()));
        }
        let trimmed = line.trim().to_string();
        debug!(line = %trimmed, "SF >");
        Ok(trimmed)
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), EngineError> {
        loop {
            if self.read_line().await? == expected {
                return Ok(());
            }
        }
    }

    /// Search the current game position to the configured depth
    async fn search(&mut self) -> Result<SearchResult, EngineError> {
        let position = if self.moves.is_empty() {
            "position startpos".to_string()
        } else {
            format!("position startpos moves {}", self.moves.join(" "))
        };
        self.send(&position).await?;
        self.send(&format!("go depth {}", self.options.depth)).await?;

        let mut result = SearchResult::default();
        loop {
            let line = self.read_line().await?;

            if line.starts_with("info") && line.contains(" score ") {
                if let Some(cp) = parse_cp(&line) {
                    result.cp = Some(cp);
                    result.mate = None;
                }
                if let Some(mate) = parse_mate(&line) {
                    result.mate = Some(mate);
                    result.cp = None;
                }
            } else if line.starts_with("bestmove") {
                if let Some(best) = line.split_whitespace().nth(1) {
                    result.best_move = best.to_string();
                }
                break;
            }
        }

        Ok(result)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

#[async_trait]
impl Evaluator for StockfishEngine {
    async fn set_start_position(&mut self) -> Result<(), EngineError> {
        self.moves.clear();
        let timeout = self.options.timeout;
        tokio::time::timeout(timeout, async {
            // A search abandoned by a timeout may still be running
            self.send("stop").await?;
            self.send("ucinewgame").await?;
            self.send("isready").await?;
            self.wait_for("readyok").await
        })
        .await
        .map_err(|_| EngineError::Timeout(timeout.as_secs()))?
    }

    async fn apply_move(&mut self, uci_move: &str) -> Result<(), EngineError> {
        if !is_uci_move(uci_move) {
            return Err(EngineError::Protocol(format!("Not a UCI move: {uci_move}")));
        }
        self.moves.push(uci_move.to_string());
        Ok(())
    }

    async fn evaluate(&mut self) -> Result<i32, EngineError> {
        let timeout = self.options.timeout;
        let result = tokio::time::timeout(timeout, self.search())
            .await
            .map_err(|_| EngineError::Timeout(timeout.as_secs()))??;

        let white_to_move = self.moves.len() % 2 == 0;
        debug!(best_move = %result.best_move, cp = ?result.cp, mate = ?result.mate, "Search done");
        eval_to_white_cp(result.cp, result.mate, white_to_move)
            .ok_or_else(|| EngineError::Protocol("Search finished without a score".into()))
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Convert a side-to-move score into White's point of view
fn eval_to_white_cp(cp: Option<i32>, mate: Option<i32>, is_white_to_move: bool) -> Option<i32> {
    let score = if let Some(m) = mate {
        if m > 0 {
            MATE_SCORE - m * 10
        } else {
            -MATE_SCORE - m * 10
        }
    } else {
        cp?
    };
    Some(if is_white_to_move { score } else { -score })
}

fn is_uci_move(s: &str) -> bool {
    let b = s.as_bytes();
    let square = |f: u8, r: u8| (b'a'..=b'h').contains(&f) && (b'1'..=b'8').contains(&r);
    match b.len() {
        4 => square(b[0], b[1]) && square(b[2], b[3]),
        5 => square(b[0], b[1]) && square(b[2], b[3]) && b"qrbn".contains(&b[4]),
        _ => false,
    }
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    parse_after(line, "cp")
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    parse_after(line, "mate")
}

fn parse_after(line: &str, keyword: &str) -> Option<i32> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    for (i, part) in parts.iter().enumerate() {
        if *part == keyword && i + 1 < parts.len() {
            return parts[i + 1].parse().ok();
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cp() {
        let line = "info depth 20 seldepth 25 multipv 1 score cp 35 nodes 100000 pv e2e4";
        assert_eq!(parse_cp(line), Some(35));
        assert_eq!(parse_mate(line), None);
    }

    #[test]
    fn test_parse_mate() {
        let line = "info depth 20 score mate -3 nodes 100000 pv e2e4";
        assert_eq!(parse_mate(line), Some(-3));
        assert_eq!(parse_mate("info depth 0 score mate 0"), Some(0));
    }

    #[test]
    fn test_eval_to_white_cp() {
        assert_eq!(eval_to_white_cp(Some(35), None, true), Some(35));
        assert_eq!(eval_to_white_cp(Some(35), None, false), Some(-35));
        // Black to move and mates in 2
        assert_eq!(eval_to_white_cp(None, Some(2), false), Some(-9980));
        // White to move and already checkmated
        assert_eq!(eval_to_white_cp(None, Some(0), true), Some(-10000));
        assert_eq!(eval_to_white_cp(None, None, true), None);
    }

    #[test]
    fn test_is_uci_move() {
        assert!(is_uci_move("e2e4"));
        assert!(is_uci_move("g7h8q"));
        assert!(!is_uci_move("e4"));
        assert!(!is_uci_move("e2e9"));
        assert!(!is_uci_move("g7h8k"));
    }
}
