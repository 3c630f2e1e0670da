use anyhow::Context as _;
use sea_orm::Database;
use tracing::info;

use beacon_core::tracing::init_tracing;
use beacon_outbox::clickhouse::{ClickHouseConfig, ClickHouseEventLog};
use beacon_outbox::{DbOutboxStore, OutboxConfig, OutboxDispatcher, OutboxRelay, OutboxWriter};

use beacon_users::config::UsersConfig;
use beacon_users::router::build_router;
use beacon_users::shutdown::{self, run_embedded_relay};
use beacon_users::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = UsersConfig::from_env()?;
    let outbox_config = OutboxConfig::from_env()?;

    let db = Database::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;

    let store = DbOutboxStore::new(db.clone());
    let outbox = OutboxWriter::new(store.clone(), outbox_config.environment.clone())
        .with_failure_policy(outbox_config.write_failure_policy);

    let (trigger, stop) = shutdown::channel();

    let relay_task = if config.embedded_relay {
        let event_log = ClickHouseEventLog::new(ClickHouseConfig::from_env()?)?;
        let dispatcher = OutboxDispatcher::new(store, event_log, outbox_config.dispatcher());
        let relay = OutboxRelay::new(dispatcher, outbox_config.relay());
        Some(tokio::spawn(run_embedded_relay(relay, stop)))
    } else {
        None
    };

    let router = build_router(AppState { db, outbox });
    let http_addr = format!("0.0.0.0:{}", config.users_port);
    let listener = tokio::net::TcpListener::bind(&http_addr)
        .await
        .with_context(|| format!("failed to bind {http_addr}"))?;

    info!("users service listening on {http_addr}");
    let served = axum::serve(listener, router)
        .with_graceful_shutdown(ctrl_c())
        .await
        .context("server error");

    // Stop the relay whether the server drained or failed.
    trigger.trigger();
    if let Some(task) = relay_task {
        task.await.context("embedded outbox relay panicked")?;
    }
    served
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
