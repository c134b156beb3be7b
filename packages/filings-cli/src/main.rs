// Command-line entry point for the filing watcher

mod config;

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use edgar_client::EdgarClient;
use filing_pipeline::{
    business_days_back, business_days_between, ExtractorRegistry, FilingProcessor, FilingStore,
    Poller, PostgresStore, SqliteStore,
};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "filings", about = "Discover, queue and process EDGAR filings")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database tables
    InitDb,

    /// Poll today's filings until interrupted
    Poll,

    /// Discover filings over past business days
    Backfill {
        /// Calendar days before today to cover
        #[arg(long, default_value_t = 365, conflicts_with = "from")]
        days: u32,

        /// First day to cover (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last day to cover (YYYY-MM-DD), defaults to yesterday
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
    },

    /// Process queued filings
    Process {
        /// Run a single pass and exit
        #[arg(long)]
        once: bool,
    },

    /// Poll and process concurrently until interrupted
    Run,

    /// Show queue statistics
    Stats {
        /// Number of form types to list
        #[arg(long, default_value_t = 10)]
        top: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,filing_pipeline=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(database = %redact(&config.database_url), "Configuration loaded");

    if config.is_postgres() {
        let store = PostgresStore::new(&config.database_url)
            .await
            .context("Failed to connect to database")?;
        execute(cli.command, &config, Arc::new(store)).await
    } else {
        let store = SqliteStore::new(&config.database_url)
            .await
            .context("Failed to open database")?;
        execute(cli.command, &config, Arc::new(store)).await
    }
}

async fn execute<S: FilingStore + 'static>(command: Command, config: &Config, store: Arc<S>) -> Result<()> {
    match command {
        Command::InitDb => {
            tracing::info!("Database ready");
        }

        Command::Poll => {
            let shutdown = shutdown_on_ctrl_c();
            poller(config, store).run_live(shutdown).await;
        }

        Command::Backfill { days, from, to } => {
            let yesterday = Local::now().date_naive().pred_opt().context("date out of range")?;
            let dates = match from {
                Some(from) => {
                    let to = to.unwrap_or(yesterday);
                    if to < from {
                        bail!("--to ({to}) is before --from ({from})");
                    }
                    business_days_between(from, to)
                }
                None => business_days_back(Local::now().date_naive(), days),
            };

            let shutdown = shutdown_on_ctrl_c();
            let report = poller(config, store.clone()).run_backfill(&dates, &shutdown).await;

            println!(
                "Backfilled {} days: {} hits, {} new, {} duplicate, {} malformed",
                report.days.len(),
                report.hits(),
                report.new_filings(),
                report.duplicates(),
                report.malformed()
            );
            let incomplete = report.incomplete_days();
            if !incomplete.is_empty() {
                println!("Incomplete days: {:?}", incomplete);
            }
            print_stats(store.as_ref(), 10).await?;
        }

        Command::Process { once } => {
            let mut processor = processor(config, store);
            if once {
                let report = processor.run_once().await.context("Processing pass failed")?;
                println!(
                    "Processed {} filings: {} extracted, {} without extractor, {} failed, {} left pending, {} signals",
                    report.entries.len(),
                    report.extracted(),
                    report.no_extractor(),
                    report.failed(),
                    report.retained(),
                    report.signals
                );
            } else {
                processor.run(shutdown_on_ctrl_c()).await;
            }
        }

        Command::Run => {
            let shutdown = shutdown_on_ctrl_c();
            let poller = poller(config, store.clone());
            let mut processor = processor(config, store);

            tokio::join!(
                poller.run_live(shutdown.clone()),
                processor.run(shutdown.clone())
            );
        }

        Command::Stats { top } => {
            print_stats(store.as_ref(), top).await?;
        }
    }

    Ok(())
}

fn poller<S: FilingStore + 'static>(config: &Config, store: Arc<S>) -> Poller<EdgarClient, S> {
    Poller::new(config.edgar_client(), store).with_config(config.poller_config())
}

fn processor<S: FilingStore + 'static>(config: &Config, store: Arc<S>) -> FilingProcessor<S> {
    FilingProcessor::new(store, Arc::new(ExtractorRegistry::with_defaults()))
        .with_config(config.processor_config())
}

async fn print_stats<S: FilingStore + ?Sized>(store: &S, top: usize) -> Result<()> {
    let stats = store.stats(top).await.context("Failed to read queue statistics")?;
    println!("{}", stats);
    for (form, count) in &stats.top_forms {
        println!("  {:<10} {}", form, count);
    }
    Ok(())
}

/// Token cancelled on the first Ctrl-C.
fn shutdown_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown requested");
            trigger.cancel();
        }
    });
    token
}

/// Strip credentials from a connection URL before logging it.
fn redact(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme), Some(at)) if at > scheme => format!("{}://***{}", &url[..scheme], &url[at..]),
        _ => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redact() {
        assert_eq!(
            redact("postgres://user:secret@db:5432/filings"),
            "postgres://***@db:5432/filings"
        );
        assert_eq!(redact("sqlite:filings.db"), "sqlite:filings.db");
    }

    #[test]
    fn test_parse_backfill_range() {
        let cli = Cli::try_parse_from(["filings", "backfill", "--from", "2024-03-04", "--to", "2024-03-08"])
            .unwrap();
        match cli.command {
            Command::Backfill { from, to, .. } => {
                assert_eq!(from, NaiveDate::from_ymd_opt(2024, 3, 4));
                assert_eq!(to, NaiveDate::from_ymd_opt(2024, 3, 8));
            }
            _ => panic!("expected backfill"),
        }

        assert!(Cli::try_parse_from(["filings", "backfill", "--to", "2024-03-08"]).is_err());
    }

    #[test]
    fn test_parse_process_once() {
        let cli = Cli::try_parse_from(["filings", "process", "--once"]).unwrap();
        assert!(matches!(cli.command, Command::Process { once: true }));
    }
}
