mod cli;

use anyhow::{Context, Result};
use chrono::{Local, Utc};
use clap::Parser;
use cli::{formatters, Cli, Commands};
use colored::Colorize;
use goldwatch::config::{resolve_config_path, Config};
use goldwatch::cycle::CycleRunner;
use goldwatch::db::SnapshotStore;
use goldwatch::reports::delta::DEFAULT_TRACKED_INSTRUMENT;
use goldwatch::scraping::gold_table::normalize_name;
use goldwatch::scraping::parse_price_table;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Logs go to stderr so command output stays clean on stdout
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.no_color {
        colored::control::set_override(false);
    }

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let config_path = resolve_config_path(cli.config.as_deref())?;
    let config = Config::load(&config_path)?;
    info!("Using config {:?}", config_path);
    Ok(config)
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command.as_ref().unwrap_or(&Commands::Run) {
        // Parsing a saved page needs no configuration
        Commands::Parse { file } => {
            let html = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {:?}", file))?;
            let snapshot = parse_price_table(&html, Utc::now())?;
            if cli.json {
                println!("{}", formatters::format_json(&snapshot));
            } else if snapshot.is_empty() {
                println!("{} No price rows found in {:?}", "ℹ".blue().bold(), file);
            } else {
                print!(
                    "{}",
                    formatters::format_snapshot_table(&snapshot, DEFAULT_TRACKED_INSTRUMENT)
                );
            }
            Ok(())
        }

        Commands::Run => {
            let runner = CycleRunner::new(load_config(&cli)?)?;
            runner.run_forever().await
        }

        Commands::Once { dry_run } => {
            let runner = CycleRunner::new(load_config(&cli)?)?;
            if *dry_run {
                let html = runner.fetch().await?;
                let outcome = runner.preview(&html, &Local::now())?;
                print!("{}", outcome.report);
                println!("\n{} Dry run - nothing stored or sent", "ℹ".blue().bold());
                return Ok(());
            }

            let (outcome, summary) = runner.run_once().await?;
            print!("{}", outcome.report);
            println!(
                "\n{} Stored {} record(s), notified {} channel(s)",
                "✓".green().bold(),
                outcome.snapshot.len(),
                summary.delivered
            );
            if summary.failed > 0 {
                println!("  Failed channels: {}", summary.failed.to_string().red());
            }
            Ok(())
        }

        Commands::Latest => {
            let config = load_config(&cli)?;
            let store = SnapshotStore::new(&config.latest_path, &config.db_path);
            let snapshot = store.read_latest()?;
            if cli.json {
                println!("{}", formatters::format_json(&snapshot));
            } else if snapshot.is_empty() {
                print!("{}", formatters::format_empty("snapshot"));
            } else {
                print!(
                    "{}",
                    formatters::format_snapshot_table(&snapshot, &config.tracked_instrument)
                );
            }
            Ok(())
        }

        Commands::History { limit, instrument } => {
            let config = load_config(&cli)?;
            let store = SnapshotStore::new(&config.latest_path, &config.db_path);
            let instrument = instrument.as_deref().map(normalize_name);
            let rows = store.recent_history(*limit, instrument.as_deref())?;
            if cli.json {
                println!("{}", formatters::format_json(&rows));
            } else if rows.is_empty() {
                print!("{}", formatters::format_empty("history"));
            } else {
                print!("{}", formatters::format_history_table(&rows));
            }
            Ok(())
        }
    }
}
