//! Arena accuracy check
//!
//! Fetches the top players of a Lichess arena, replays each of their games
//! against local Stockfish and reports the games at or above an accuracy
//! threshold for human review.

use accuracy_analyzer::StockfishEngine;
use anyhow::Context;
use arena_check::cli::Cli;
use arena_check::clients::LichessClient;
use arena_check::config::ScanConfig;
use arena_check::error::ScanError;
use arena_check::events::TracingObserver;
use arena_check::scan::{EnginePool, ScanSummary, Scanner};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let config = ScanConfig::from_env();
    let request = cli.scan_request();
    request.validate()?;
    let workers = cli.worker_count(num_cpus::get());

    println!("* SUMMARY:");
    println!("Stockfish path: {}", config.stockfish_path);
    println!("Tournament ID: {}", request.tournament_id);
    println!("Accuracy threshold: {}%", request.threshold);
    println!("Players to check: top {}", request.top_n);
    println!("Workers: {workers}");
    println!("{}", "-".repeat(20));

    if !cli.yes && !confirm("Are you sure you want to continue? (y/N) ").await? {
        return Ok(());
    }

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping scan");
                cancel.cancel();
            }
        }
    });

    let mut engines = Vec::with_capacity(workers);
    for i in 0..workers {
        let engine = StockfishEngine::new(&config.stockfish_path, config.engine.clone())
            .await
            .with_context(|| format!("Failed to start Stockfish at {}", config.stockfish_path))?;
        info!(engine_id = i, "Stockfish engine ready");
        engines.push(engine);
    }

    let client = LichessClient::new(&config.api_base_url, cancel.clone())?;
    let scanner = Scanner::new(client, EnginePool::new(engines), cancel)
        .with_thresholds(config.thresholds)
        .with_site_url(&config.site_url);

    let outcome = scanner.run(&request, &mut TracingObserver).await;

    info!("Shutting down Stockfish engines");
    for mut engine in scanner.into_engines() {
        engine.quit().await;
    }

    let summary = match outcome {
        Ok(summary) => summary,
        Err(ScanError::Api(e)) => {
            error!(error = %e, "Scan aborted");
            eprintln!("{}", "-".repeat(20));
            eprintln!("API request failed too many times, quitting.");
            eprintln!("{}", "-".repeat(20));
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

async fn confirm(prompt: &str) -> anyhow::Result<bool> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(prompt.as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;
    Ok(matches!(answer.trim(), "y" | "Y"))
}

fn print_summary(summary: &ScanSummary) {
    println!("{}", "-".repeat(20));
    for game in &summary.flagged {
        println!(
            "** Player: {} ({:?}), Game: {}, Accuracy: {}% (perfect {}, decent {}, mistakes {})",
            game.username,
            game.side,
            game.link,
            game.accuracy,
            game.perfect_moves,
            game.decent_moves,
            game.mistakes
        );
    }
    if summary.cancelled {
        println!("Scan cancelled after {} players.", summary.players_scanned.len());
    } else if !summary.any_flagged() {
        println!(
            "No games exceeding the accuracy threshold were found for the top {} players.",
            summary.players_scanned.len()
        );
    } else {
        println!("High accuracy game check finished.");
    }
    println!(
        "Games analyzed: {}, skipped: {}, incomplete: {}",
        summary.games_analyzed, summary.skipped_games, summary.failed_analyses
    );
    println!("{}", "-".repeat(20));
}
