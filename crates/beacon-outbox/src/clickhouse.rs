use std::sync::Arc;

use anyhow::{Context as _, anyhow};
use reqwest::{Client, Response, Url};

use crate::client::{EventLogClient, EventLogConnection, EventLogRow};
use crate::config::parse_var;
use crate::error::OutboxError;

/// ClickHouse HTTP interface settings, loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClickHouseConfig {
    /// HTTP endpoint, e.g. `http://clickhouse:8123`. Env var: `CLICKHOUSE_URL`.
    pub url: Url,
    /// Env var: `CLICKHOUSE_DATABASE` (default `default`).
    pub database: String,
    /// Env var: `CLICKHOUSE_EVENT_LOG_TABLE` (default `event_log`).
    pub table: String,
    /// Env var: `CLICKHOUSE_USER` (default `default`).
    pub user: String,
    /// Env var: `CLICKHOUSE_PASSWORD` (default empty).
    pub password: String,
}

impl ClickHouseConfig {
    pub fn from_env() -> Result<Self, OutboxError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, OutboxError> {
        let url = parse_var::<Url>(&lookup, "CLICKHOUSE_URL")?
            .ok_or_else(|| OutboxError::config("CLICKHOUSE_URL is not set"))?;
        let database = lookup("CLICKHOUSE_DATABASE").unwrap_or_else(|| "default".to_owned());
        let table = lookup("CLICKHOUSE_EVENT_LOG_TABLE").unwrap_or_else(|| "event_log".to_owned());
        for (key, ident) in [
            ("CLICKHOUSE_DATABASE", &database),
            ("CLICKHOUSE_EVENT_LOG_TABLE", &table),
        ] {
            if !is_identifier(ident) {
                return Err(OutboxError::config(format!(
                    "{key}={ident:?} is not a valid identifier"
                )));
            }
        }
        Ok(Self {
            url,
            database,
            table,
            user: lookup("CLICKHOUSE_USER").unwrap_or_else(|| "default".to_owned()),
            password: lookup("CLICKHOUSE_PASSWORD").unwrap_or_default(),
        })
    }

    fn insert_query(&self) -> String {
        format!(
            "INSERT INTO {}.{} (event_type, event_date_time, environment, event_context) FORMAT JSONEachRow",
            self.database, self.table
        )
    }
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Event log client writing to a ClickHouse table over HTTP.
#[derive(Clone)]
pub struct ClickHouseEventLog {
    http: Client,
    config: Arc<ClickHouseConfig>,
}

impl ClickHouseEventLog {
    pub fn new(config: ClickHouseConfig) -> Result<Self, OutboxError> {
        let http = Client::builder()
            .build()
            .map_err(|e| OutboxError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            http,
            config: Arc::new(config),
        })
    }
}

impl EventLogClient for ClickHouseEventLog {
    type Connection = ClickHouseConnection;

    /// Checks the server answers `/ping` before handing out a connection.
    async fn connect(&self) -> Result<ClickHouseConnection, OutboxError> {
        let ping = self
            .config
            .url
            .join("ping")
            .context("build clickhouse ping url")
            .map_err(OutboxError::TransientDelivery)?;
        let resp = self
            .http
            .get(ping)
            .send()
            .await
            .context("ping clickhouse")
            .map_err(OutboxError::TransientDelivery)?;
        ensure_success(resp).await?;
        Ok(ClickHouseConnection {
            http: self.http.clone(),
            config: Arc::clone(&self.config),
        })
    }
}

pub struct ClickHouseConnection {
    http: Client,
    config: Arc<ClickHouseConfig>,
}

impl EventLogConnection for ClickHouseConnection {
    async fn insert(&mut self, rows: &[EventLogRow]) -> Result<(), OutboxError> {
        if rows.is_empty() {
            return Ok(());
        }
        let body = encode_json_each_row(rows)?;
        let mut url = self.config.url.clone();
        url.query_pairs_mut()
            .append_pair("query", &self.config.insert_query())
            .append_pair("date_time_input_format", "best_effort");

        let resp = self
            .http
            .post(url)
            .header("X-ClickHouse-User", &self.config.user)
            .header("X-ClickHouse-Key", &self.config.password)
            .body(body)
            .send()
            .await
            .context("insert into clickhouse event log")
            .map_err(OutboxError::TransientDelivery)?;
        ensure_success(resp).await
    }
}

/// Newline-delimited JSON, one object per row, in batch order.
fn encode_json_each_row(rows: &[EventLogRow]) -> Result<String, OutboxError> {
    let lines = rows
        .iter()
        .map(serde_json::to_string)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lines.join("\n"))
}

async fn ensure_success(resp: Response) -> Result<(), OutboxError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(());
    }
    let body = resp.text().await.unwrap_or_default();
    Err(OutboxError::TransientDelivery(anyhow!(
        "clickhouse returned {status}: {}",
        body.trim()
    )))
}
