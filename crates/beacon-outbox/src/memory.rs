use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::entry::{NewOutboxEntry, OutboxEntry, OutboxId};
use crate::error::OutboxError;
use crate::store::OutboxStore;

/// In-process outbox store for tests and local development.
///
/// Appends are staged on a [`MemoryTx`] and only become visible on
/// [`commit`](MemoryOutboxStore::commit); dropping the transaction discards them.
#[derive(Clone, Default)]
pub struct MemoryOutboxStore {
    rows: Arc<Mutex<Vec<OutboxEntry>>>,
}

/// Unit of work for [`MemoryOutboxStore`].
#[derive(Default)]
pub struct MemoryTx {
    staged: Mutex<Vec<NewOutboxEntry>>,
}

impl MemoryTx {
    pub fn staged_len(&self) -> usize {
        lock(&self.staged).len()
    }
}

impl MemoryOutboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> MemoryTx {
        MemoryTx::default()
    }

    /// Make the staged entries visible, assigning ids in append order.
    pub fn commit(&self, tx: MemoryTx) -> Vec<OutboxId> {
        let staged = tx.staged.into_inner().unwrap_or_else(PoisonError::into_inner);
        let mut rows = lock(&self.rows);
        staged
            .into_iter()
            .map(|entry| {
                let id = rows.len() as OutboxId + 1;
                rows.push(OutboxEntry {
                    id,
                    event_type: entry.event_type,
                    occurred_at: entry.occurred_at,
                    environment: entry.environment,
                    payload: entry.payload,
                    processed: false,
                    processed_at: None,
                });
                id
            })
            .collect()
    }

    /// Snapshot of every committed entry, processed or not.
    pub fn entries(&self) -> Vec<OutboxEntry> {
        lock(&self.rows).clone()
    }

    pub fn pending_count(&self) -> usize {
        lock(&self.rows).iter().filter(|e| e.is_pending()).count()
    }
}

impl OutboxStore for MemoryOutboxStore {
    type Tx = MemoryTx;

    async fn append(&self, tx: &MemoryTx, entries: Vec<NewOutboxEntry>) -> Result<(), OutboxError> {
        lock(&tx.staged).extend(entries);
        Ok(())
    }

    async fn select_pending(&self, limit: u64) -> Result<Vec<OutboxEntry>, OutboxError> {
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(lock(&self.rows)
            .iter()
            .filter(|e| e.is_pending())
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_processed(&self, ids: &[OutboxId], at: DateTime<Utc>) -> Result<(), OutboxError> {
        let mut rows = lock(&self.rows);
        for entry in rows.iter_mut().filter(|e| ids.contains(&e.id)) {
            if entry.is_pending() {
                entry.processed = true;
                entry.processed_at = Some(at);
            }
        }
        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
