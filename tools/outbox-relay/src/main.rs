//! Outbox relay: drains the `event_outbox` table into the ClickHouse event log.
//!
//! # Usage
//!
//! ```bash
//! # Poll until interrupted
//! cargo run -p outbox-relay -- run
//!
//! # One bounded batch, for cron-style schedulers
//! cargo run -p outbox-relay -- drain-once --retry
//! ```
//!
//! Reads `DATABASE_URL`, the `OUTBOX_*` and `CLICKHOUSE_*` variables, and
//! `ENVIRONMENT`, after loading `.env` when present.

use anyhow::{Context as _, Result};
use clap::{Parser, Subcommand};
use sea_orm::Database;
use tracing::info;

use beacon_core::tracing::init_tracing;
use beacon_outbox::clickhouse::{ClickHouseConfig, ClickHouseEventLog};
use beacon_outbox::{DbOutboxStore, DrainOutcome, OutboxConfig, OutboxDispatcher, OutboxRelay};

#[derive(Parser)]
#[command(about = "Ship pending outbox events to the event log")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drain on the configured poll interval until Ctrl-C
    Run,
    /// Ship at most one batch and exit
    DrainOnce {
        /// Retry failed drains after OUTBOX_RETRY_DELAY_SECS, up to OUTBOX_MAX_RETRIES
        #[arg(long)]
        retry: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();

    let outbox_config = OutboxConfig::from_env()?;
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
    let db = Database::connect(&database_url)
        .await
        .context("failed to connect to database")?;
    let event_log = ClickHouseEventLog::new(ClickHouseConfig::from_env()?)?;

    let dispatcher = OutboxDispatcher::new(
        DbOutboxStore::new(db),
        event_log,
        outbox_config.dispatcher(),
    );
    let relay = OutboxRelay::new(dispatcher, outbox_config.relay());

    match args.command {
        Command::Run => {
            relay.run_until(shutdown_signal()).await;
        }
        Command::DrainOnce { retry: false } => {
            relay.drain_outbox_once().await?;
        }
        Command::DrainOnce { retry: true } => {
            if let DrainOutcome::Shipped(n) = relay.drain_with_retry().await? {
                info!(count = n, "drained outbox batch");
            }
        }
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
