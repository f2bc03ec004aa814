mod config;
mod loader;
mod models;
mod pipeline;
mod scraper;
mod storage;
mod utils;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{AppConfig, Credentials};
use crate::pipeline::Pipeline;
use crate::storage::Repository;

#[derive(Parser)]
#[command(name = "screener-etl", about = "Profit & Loss scraper and loader", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Log in, scrape every configured company and write the CSV artifact
    Scrape {
        /// Output CSV (default: output.csv_path from config)
        #[arg(long, env = "CSV_PATH")]
        csv: Option<PathBuf>,
    },

    /// Load the CSV artifact into the destination table
    Load {
        /// Input CSV (default: output.csv_path from config)
        #[arg(long, env = "CSV_PATH")]
        csv: Option<PathBuf>,
    },

    /// Show row counts per period in the destination table
    Stats,

    /// List the configured companies
    Companies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "screener_etl=info,warn",
        1 => "screener_etl=debug,info",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(filter)
        .init();

    let config = AppConfig::load()?;

    match cli.command {
        Command::Scrape { csv } => {
            let _t = utils::Timer::start("Scrape");
            let credentials = Credentials::from_env()?;
            let csv = csv.unwrap_or_else(|| config.output.csv_path.clone());
            let stats = Pipeline::new(config).run(&credentials, &csv).await?;
            info!(
                "Saved {} records from {} companies to {:?}",
                stats.records,
                stats.companies - stats.failed.len(),
                csv
            );
        }

        Command::Load { csv } => {
            let _t = utils::Timer::start("Load");
            let csv = csv.unwrap_or_else(|| config.output.csv_path.clone());
            info!("Loading {:?} into {} ({})", csv, config.store.table, config.store.redacted_url());
            let rows = loader::load(&csv, &config.store)
                .with_context(|| format!("Error loading {:?} into {}", csv, config.store.table))?;
            info!("Inserted {} rows into {}", rows, config.store.table);
        }

        Command::Stats => {
            let repo = Repository::open(&config.store)?;
            let per_period = repo.rows_per_period()?;
            println!("─────────────────────────────────");
            println!("  {}: rows per period", config.store.table);
            println!("─────────────────────────────────");
            for (period, rows) in &per_period {
                println!("  {:<12} : {}", period, rows);
            }
            println!("  Total        : {}", repo.row_count()?);
            println!("─────────────────────────────────");
        }

        Command::Companies => {
            println!("{} companies:", config.companies.len());
            for c in &config.companies {
                println!("  {:<12} {}", c.id, c.url);
            }
        }
    }

    Ok(())
}
