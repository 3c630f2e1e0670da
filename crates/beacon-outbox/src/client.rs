#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::entry::OutboxEntry;
use crate::error::OutboxError;

/// Row shipped to the event log: `(event_type, event_date_time, environment, event_context)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventLogRow {
    pub event_type: String,
    pub event_date_time: DateTime<Utc>,
    pub environment: String,
    pub event_context: String,
}

impl From<&OutboxEntry> for EventLogRow {
    fn from(entry: &OutboxEntry) -> Self {
        Self {
            event_type: entry.event_type.clone(),
            event_date_time: entry.occurred_at,
            environment: entry.environment.clone(),
            event_context: entry.payload.clone(),
        }
    }
}

/// External event log sink. Hands out scoped connections.
pub trait EventLogClient: Send + Sync {
    type Connection: EventLogConnection;

    async fn connect(&self) -> Result<Self::Connection, OutboxError>;
}

/// A connection acquired from an [`EventLogClient`]; released when dropped.
pub trait EventLogConnection: Send {
    /// Insert rows in the given order. Failures are transient.
    async fn insert(&mut self, rows: &[EventLogRow]) -> Result<(), OutboxError>;
}
