use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::dispatcher::DispatcherConfig;
use crate::error::OutboxError;
use crate::relay::RelayConfig;

/// Deployment environment tag stamped on every outbox entry (e.g. `production`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment(String);

impl Environment {
    pub fn new(tag: impl Into<String>) -> Result<Self, OutboxError> {
        let tag = tag.into();
        if tag.is_empty() {
            return Err(OutboxError::config("environment tag must not be empty"));
        }
        if tag.chars().any(char::is_whitespace) {
            return Err(OutboxError::config(format!(
                "environment tag {tag:?} must not contain whitespace"
            )));
        }
        Ok(Self(tag))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Upper bound on how many entries one dispatcher invocation selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchSize(u32);

impl BatchSize {
    pub const DEFAULT: Self = Self(100);
    pub const MAX: u32 = 10_000;

    pub fn new(size: u32) -> Result<Self, OutboxError> {
        if size == 0 || size > Self::MAX {
            return Err(OutboxError::config(format!(
                "batch size must be between 1 and {}, got {size}",
                Self::MAX
            )));
        }
        Ok(Self(size))
    }

    pub fn get(self) -> u64 {
        u64::from(self.0)
    }
}

impl Default for BatchSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What the writer does when persisting outbox entries fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteFailurePolicy {
    /// Log and swallow: the business transaction carries on without its events.
    #[default]
    BestEffort,
    /// Return the error so the caller can abort its transaction.
    Strict,
}

/// Outbox configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct OutboxConfig {
    /// Env var: `ENVIRONMENT` (required).
    pub environment: Environment,
    /// Env var: `OUTBOX_BATCH_SIZE` (default 100).
    pub batch_size: BatchSize,
    /// Env var: `OUTBOX_STRICT_WRITES` (default false).
    pub write_failure_policy: WriteFailurePolicy,
    /// Env var: `OUTBOX_DELIVERY_TIMEOUT_SECS` (default 30).
    pub delivery_timeout: Duration,
    /// Env var: `OUTBOX_POLL_INTERVAL_SECS` (default 5).
    pub poll_interval: Duration,
    /// Env var: `OUTBOX_RETRY_DELAY_SECS` (default 10).
    pub retry_delay: Duration,
    /// Env var: `OUTBOX_MAX_RETRIES` (unset retries forever).
    pub max_retries: Option<u32>,
}

impl OutboxConfig {
    /// Load from the process environment. Invalid values are fatal at startup.
    pub fn from_env() -> Result<Self, OutboxError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, OutboxError> {
        let environment = lookup("ENVIRONMENT")
            .ok_or_else(|| OutboxError::config("ENVIRONMENT is not set"))
            .and_then(Environment::new)?;
        let batch_size = match parse_var::<u32>(&lookup, "OUTBOX_BATCH_SIZE")? {
            Some(size) => BatchSize::new(size)?,
            None => BatchSize::DEFAULT,
        };
        let write_failure_policy = match parse_var::<bool>(&lookup, "OUTBOX_STRICT_WRITES")? {
            Some(true) => WriteFailurePolicy::Strict,
            _ => WriteFailurePolicy::BestEffort,
        };
        let delivery_timeout = secs_var(&lookup, "OUTBOX_DELIVERY_TIMEOUT_SECS", 30)?;
        let poll_interval = secs_var(&lookup, "OUTBOX_POLL_INTERVAL_SECS", 5)?;
        let retry_delay = secs_var(&lookup, "OUTBOX_RETRY_DELAY_SECS", 10)?;
        let max_retries = parse_var::<u32>(&lookup, "OUTBOX_MAX_RETRIES")?;

        Ok(Self {
            environment,
            batch_size,
            write_failure_policy,
            delivery_timeout,
            poll_interval,
            retry_delay,
            max_retries,
        })
    }

    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig {
            batch_size: self.batch_size,
            delivery_timeout: self.delivery_timeout,
        }
    }

    pub fn relay(&self) -> RelayConfig {
        RelayConfig {
            poll_interval: self.poll_interval,
            retry_delay: self.retry_delay,
            max_retries: self.max_retries,
        }
    }
}

/// Parse an optional variable; present-but-invalid values are configuration errors.
pub(crate) fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>, OutboxError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| OutboxError::config(format!("{key}={raw:?} is invalid: {e}")))
        })
        .transpose()
}

fn secs_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<Duration, OutboxError> {
    let secs = parse_var::<u64>(lookup, key)?.unwrap_or(default);
    if secs == 0 {
        return Err(OutboxError::config(format!("{key} must be greater than zero")));
    }
    Ok(Duration::from_secs(secs))
}
