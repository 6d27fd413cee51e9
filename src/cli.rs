use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "sentinel",
    version,
    about = "Supply-chain news ingestion with LLM risk scoring"
)]
pub struct Cli {
    /// Config file (defaults to <config dir>/sentinel/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the database path from the config file
    #[arg(long, global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Ingest news for a random topic (with retries), then score unscored articles
    Run,

    /// One ingestion attempt, without scoring
    Ingest {
        /// Search query to use instead of a random topic
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Score every unscored article in the database
    Score,

    /// Print scored articles, highest risk first
    List {
        #[arg(long)]
        min_score: Option<u8>,

        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Open the terminal dashboard
    View {
        #[arg(long)]
        min_score: Option<u8>,
    },
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }
}
