#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};

use crate::entry::{NewOutboxEntry, OutboxEntry, OutboxId};
use crate::error::OutboxError;

/// Durable outbox table: the single source of truth for what still has to be delivered.
///
/// Entries are only ever appended and marked processed, never deleted.
/// Implementations must be safe for writers appending while a dispatcher marks.
pub trait OutboxStore: Send + Sync {
    /// The caller's unit of work that [`append`](Self::append) joins.
    type Tx: Send + Sync;

    /// Persist entries as part of `tx`. Rolling `tx` back discards them; on
    /// error none of them become visible.
    async fn append(&self, tx: &Self::Tx, entries: Vec<NewOutboxEntry>)
    -> Result<(), OutboxError>;

    /// Up to `limit` unprocessed entries, oldest (lowest id) first.
    async fn select_pending(&self, limit: u64) -> Result<Vec<OutboxEntry>, OutboxError>;

    /// Mark entries processed at `at`. Ids already processed keep their first
    /// `processed_at`; unknown ids are ignored.
    async fn mark_processed(&self, ids: &[OutboxId], at: DateTime<Utc>)
    -> Result<(), OutboxError>;
}
