use clap::Parser;

use crate::scan::ScanRequest;

/// Check the accuracy of the top players of a Lichess arena tournament.
#[derive(Parser, Debug, Clone)]
#[command(name = "arena-check", version)]
pub struct Cli {
    /// Arena tournament ID: the last 8 characters of
    /// https://lichess.org/tournament/xxxxxxxx
    pub tournament_id: String,

    /// Accuracy (percent) at or above which a game is flagged
    #[arg(short, long, default_value_t = 95.0)]
    pub threshold: f64,

    /// Number of players from the top of the standings to check
    #[arg(short = 'n', long, default_value_t = 10)]
    pub topn: usize,

    /// Games analysed in parallel, one Stockfish process each
    #[arg(short, long, default_value_t = 1)]
    pub workers: usize,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn scan_request(&self) -> ScanRequest {
        ScanRequest {
            tournament_id: self.tournament_id.clone(),
            threshold: self.threshold,
            top_n: self.topn,
        }
    }

    /// Requested workers clamped to `1..=available`
    pub fn worker_count(&self, available: usize) -> usize {
        self.workers.clamp(1, available.max(1))
    }
}
