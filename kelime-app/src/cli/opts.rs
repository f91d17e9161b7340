use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use kelime_core::DEFAULT_DAILY_GOAL;

#[derive(Debug, Parser, Clone)]
#[command(name = "kelime", version, about = "Turkish vocabulary review with SM-2 scheduling")]
pub struct Cli {
    /// JSON store file (defaults to the app data dir)
    #[arg(long, env = "KELIME_STORE")]
    pub store: Option<PathBuf>,

    /// Log filter, e.g. `info` or `kelime=debug`
    #[arg(long, env = "KELIME_LOG", default_value = "warn")]
    pub log_level: String,

    /// Cards per day counted towards the daily goal in `stats`
    #[arg(long, default_value_t = DEFAULT_DAILY_GOAL)]
    pub daily_goal: u32,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Card operations
    #[command(subcommand)]
    Card(CardCmd),
    /// Review cards interactively
    Review(ReviewCmd),
    /// Show learning statistics
    Stats,
    /// Add the built-in starter vocabulary
    Seed,
    /// Export data
    #[command(subcommand)]
    Export(ExportCmd),
    /// Import data
    #[command(subcommand)]
    Import(ImportCmd),
}

#[derive(Debug, Subcommand, Clone)]
pub enum CardCmd {
    Add(CardAdd),
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        query: Option<String>,
    },
    Rm {
        card_id: String,
    },
}

#[derive(Debug, Args, Clone)]
pub struct CardAdd {
    #[arg(long)]
    pub turkish: String,
    #[arg(long)]
    pub english: String,
    #[arg(long)]
    pub pronunciation: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    /// Explicit card id (a UUID is generated otherwise)
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Debug, Args, Clone)]
pub struct ReviewCmd {
    /// Only cards whose next review is due
    #[arg(long)]
    pub due_only: bool,
    #[arg(long)]
    pub category: Option<String>,
    /// Stop after this many cards (all selected cards by default)
    #[arg(long)]
    pub max: Option<usize>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum ExportCmd {
    Json { path: PathBuf },
    Csv { path: PathBuf },
}

#[derive(Debug, Subcommand, Clone)]
pub enum ImportCmd {
    Json { path: PathBuf },
    Csv { path: PathBuf },
}
