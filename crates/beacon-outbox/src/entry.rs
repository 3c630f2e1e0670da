use chrono::{DateTime, Utc};

/// Store-assigned, monotonically increasing outbox row id.
pub type OutboxId = i64;

/// An outbox row as produced by the writer, before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOutboxEntry {
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub environment: String,
    pub payload: String,
}

/// A persisted outbox row.
///
/// `processed` flips to `true` at most once, together with `processed_at`;
/// `payload` never changes after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxEntry {
    pub id: OutboxId,
    pub event_type: String,
    pub occurred_at: DateTime<Utc>,
    pub environment: String,
    pub payload: String,
    pub processed: bool,
    pub processed_at: Option<DateTime<Utc>>,
}

impl OutboxEntry {
    pub fn is_pending(&self) -> bool {
        !self.processed
    }
}
