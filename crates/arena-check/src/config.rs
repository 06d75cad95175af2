//! Scan configuration from environment variables

use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use accuracy_analyzer::analysis::{MISTAKE_MIN_CP_LOSS, PERFECT_MAX_CP_LOSS};
use accuracy_analyzer::{EngineOptions, Thresholds};
use tracing::{info, warn};

use crate::clients::lichess::LICHESS_API_BASE_URL;
use crate::scan::LICHESS_SITE_URL;

const DEFAULT_STOCKFISH_PATH: &str = "/usr/local/bin/stockfish";

/// File holding the engine path, read when STOCKFISH_PATH is not set
const STOCKFISH_PATH_FILE: &str = "stockfish-path.txt";

#[derive(Clone, Debug)]
pub struct ScanConfig {
    /// Lichess API root, e.g. https://lichess.org/api
    pub api_base_url: String,

    /// Site root used to build game links
    pub site_url: String,

    /// Path to Stockfish binary
    pub stockfish_path: String,

    pub engine: EngineOptions,

    pub thresholds: Thresholds,
}

impl ScanConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let stockfish_path = resolve_stockfish_path(
            env::var("STOCKFISH_PATH").ok(),
            read_path_file(Path::new(STOCKFISH_PATH_FILE)),
        );
        info!(stockfish_path = %stockfish_path, "Resolved Stockfish path");

        let defaults = EngineOptions::default();
        let engine = EngineOptions {
            depth: env_or("ENGINE_DEPTH", defaults.depth),
            threads: env_or("ENGINE_THREADS", defaults.threads),
            hash_mb: env_or("ENGINE_HASH_MB", defaults.hash_mb),
            timeout: Duration::from_secs(env_or(
                "ENGINE_TIMEOUT_SECS",
                defaults.timeout.as_secs(),
            )),
        };

        let thresholds = Thresholds {
            perfect_below: env_or("PERFECT_CP_LOSS", PERFECT_MAX_CP_LOSS),
            mistake_above: env_or("MISTAKE_CP_LOSS", MISTAKE_MIN_CP_LOSS),
        };

        Self {
            api_base_url: env::var("LICHESS_API_BASE_URL")
                .unwrap_or_else(|_| LICHESS_API_BASE_URL.to_string()),
            site_url: env::var("LICHESS_SITE_URL").unwrap_or_else(|_| LICHESS_SITE_URL.to_string()),
            stockfish_path,
            engine,
            thresholds,
        }
    }
}

fn env_or<T: FromStr + Copy>(key: &str, default: T) -> T {
    parse_or(key, env::var(key).ok(), default)
}

fn parse_or<T: FromStr + Copy>(key: &str, value: Option<String>, default: T) -> T {
    match value {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Invalid value, using default");
            default
        }),
    }
}

fn read_path_file(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

/// Env var first, then the first line of the path file, then the default
fn resolve_stockfish_path(from_env: Option<String>, from_file: Option<String>) -> String {
    from_env
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .or_else(|| {
            from_file
                .as_deref()
                .and_then(|contents| contents.lines().next())
                .map(|line| line.trim().to_string())
                .filter(|p| !p.is_empty())
        })
        .unwrap_or_else(|| DEFAULT_STOCKFISH_PATH.to_string())
}
