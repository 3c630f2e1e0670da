use std::time::Duration;

use anyhow::anyhow;
use chrono::Utc;
use tracing::{debug, info};

use crate::client::{EventLogClient, EventLogConnection, EventLogRow};
use crate::config::BatchSize;
use crate::entry::OutboxId;
use crate::error::OutboxError;
use crate::store::OutboxStore;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    pub batch_size: BatchSize,
    /// Bound on acquiring an event log connection plus the insert.
    pub delivery_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: BatchSize::DEFAULT,
            delivery_timeout: Duration::from_secs(30),
        }
    }
}

/// Result of one successful drain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Nothing was pending; the event log was not contacted.
    Idle,
    /// This many entries were shipped and acknowledged.
    Shipped(usize),
}

/// Drains the outbox into the event log: select, ship, acknowledge.
///
/// Delivery is at-least-once. A failure after the event log accepted a batch
/// but before it was acknowledged leaves the entries pending, and the next
/// drain ships them again. Overlapping drains may also ship the same entries
/// twice; neither case loses an entry.
pub struct OutboxDispatcher<S, C> {
    store: S,
    client: C,
    config: DispatcherConfig,
}

impl<S, C> OutboxDispatcher<S, C>
where
    S: OutboxStore,
    C: EventLogClient,
{
    pub fn new(store: S, client: C, config: DispatcherConfig) -> Self {
        Self {
            store,
            client,
            config,
        }
    }

    pub fn batch_size(&self) -> BatchSize {
        self.config.batch_size
    }

    /// Run one select-ship-acknowledge cycle over at most one batch.
    ///
    /// Any failure aborts the whole invocation; nothing already shipped is
    /// rolled back.
    pub async fn drain_once(&self) -> Result<DrainOutcome, OutboxError> {
        let batch = self.store.select_pending(self.config.batch_size.get()).await?;
        if batch.is_empty() {
            info!("no events in outbox");
            return Ok(DrainOutcome::Idle);
        }

        let rows: Vec<EventLogRow> = batch.iter().map(EventLogRow::from).collect();
        let ids: Vec<OutboxId> = batch.iter().map(|e| e.id).collect();
        debug!(count = ids.len(), first_id = ids[0], "shipping outbox batch");

        self.ship(&rows).await?;
        self.store.mark_processed(&ids, Utc::now()).await?;

        info!(count = ids.len(), "shipped outbox batch");
        Ok(DrainOutcome::Shipped(ids.len()))
    }

    async fn ship(&self, rows: &[EventLogRow]) -> Result<(), OutboxError> {
        let timeout = self.config.delivery_timeout;
        // The connection is dropped when this future finishes or is cancelled by the timeout.
        let deliver = async {
            let mut conn = self.client.connect().await?;
            conn.insert(rows).await
        };
        tokio::time::timeout(timeout, deliver)
            .await
            .map_err(|_| {
                OutboxError::TransientDelivery(anyhow!(
                    "event log did not answer within {}s",
                    timeout.as_secs_f64()
                ))
            })?
    }
}
