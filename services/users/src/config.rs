use anyhow::Context as _;

/// Users service configuration loaded from environment variables.
#[derive(Debug)]
pub struct UsersConfig {
    /// Database connection URL. Env var: `DATABASE_URL`.
    pub database_url: String,
    /// TCP port for the HTTP server (default 3113). Env var: `USERS_PORT`.
    pub users_port: u16,
    /// Run the outbox relay inside this process (default false).
    /// Env var: `OUTBOX_EMBEDDED_RELAY`.
    pub embedded_relay: bool,
}

impl UsersConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: std::env::var("DATABASE_URL").context("DATABASE_URL is not set")?,
            users_port: std::env::var("USERS_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3113),
            embedded_relay: std::env::var("OUTBOX_EMBEDDED_RELAY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
        })
    }
}
