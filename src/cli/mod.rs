use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub mod formatters;

#[derive(Parser)]
#[command(name = "goldwatch")]
#[command(version, about = "Gold price watcher with chat notifications")]
#[command(
    long_about = "Scrapes the gold price table twice a day, keeps the latest snapshot and a SQLite history, and pushes the tracked instrument's change to Telegram and Slack."
)]
pub struct Cli {
    /// Config file (defaults to ./goldwatch.toml, then the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Disable colorized/ANSI output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Output results in JSON format
    #[arg(long = "json", global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Commands {
    /// Run forever, one cycle at each scheduled slot (default)
    Run,

    /// Run a single cycle right now
    Once {
        /// Print the report only; nothing is stored or sent
        #[arg(short, long)]
        dry_run: bool,
    },

    /// Parse a saved copy of the price page and print its records
    Parse {
        /// Path to the HTML file
        file: PathBuf,
    },

    /// Show the latest stored snapshot
    Latest,

    /// Show stored price history, newest first
    History {
        /// Maximum number of rows
        #[arg(short, long, default_value_t = 20)]
        limit: usize,

        /// Only rows for this instrument (exact name)
        #[arg(short, long)]
        instrument: Option<String>,
    },
}
