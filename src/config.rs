use crate::autopilot::DEFAULT_BUDGET;
use crate::engine::INITIAL_INTERVAL;
use crate::high_score::HIGH_SCORE_FILE;
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

pub const LOG_FILE: &str = "snekpilot.log";

#[derive(Parser, Debug, Clone)]
#[command(name = "snekpilot", version, about = "Terminal snake with an optional autopilot")]
pub struct Options {
    /// Let a built-in autopilot steer (e.g. `greedy`). Toggle in game with `p`.
    #[arg(long)]
    pub autopilot: Option<String>,

    /// Longest the autopilot may think per tick, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_BUDGET.as_millis() as u64)]
    pub autopilot_budget_ms: u64,

    /// Seed for food placement, for repeatable games.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Starting tick interval in milliseconds (60 to 260).
    #[arg(long, default_value_t = INITIAL_INTERVAL.as_millis() as u64)]
    pub speed_ms: u64,

    #[arg(long, default_value = HIGH_SCORE_FILE)]
    pub high_score_file: PathBuf,

    /// Keep the high score in memory only.
    #[arg(long)]
    pub no_save: bool,

    #[arg(long, default_value = LOG_FILE)]
    pub log_file: PathBuf,

    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,
}

impl Options {
    pub fn autopilot_budget(&self) -> Duration {
        Duration::from_millis(self.autopilot_budget_ms)
    }

    pub fn speed(&self) -> Duration {
        Duration::from_millis(self.speed_ms)
    }
}
