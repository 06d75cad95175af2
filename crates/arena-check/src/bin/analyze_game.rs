//! Analyze a single move text against local Stockfish.
//!
//! Usage: analyze-game [--black] e4 e5 Nf3 Nc6 ...

use accuracy_analyzer::{analyze_game, Color, StockfishEngine};
use anyhow::Context;
use arena_check::config::ScanConfig;
use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "analyze-game")]
struct Args {
    /// Score Black's moves instead of White's
    #[arg(long)]
    black: bool,

    /// SAN moves, as separate arguments or one quoted string
    #[arg(required = true)]
    moves: Vec<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = ScanConfig::from_env();
    let color = if args.black { Color::Black } else { Color::White };

    let mut engine = StockfishEngine::new(&config.stockfish_path, config.engine.clone())
        .await
        .with_context(|| format!("Failed to start Stockfish at {}", config.stockfish_path))?;

    let moves = args.moves.join(" ");
    let result = analyze_game(&mut engine, &moves, color, &config.thresholds).await;
    engine.quit().await;

    println!("{}", serde_json::to_string_pretty(&result.report)?);
    if let Some(failure) = result.failure {
        eprintln!("Analysis stopped early: {failure}");
    }

    Ok(())
}
