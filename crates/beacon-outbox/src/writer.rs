use std::sync::Arc;

use tracing::error;

use crate::clock::MonotonicClock;
use crate::config::{Environment, WriteFailurePolicy};
use crate::entry::NewOutboxEntry;
use crate::error::OutboxError;
use crate::event::DomainEvent;
use crate::store::OutboxStore;

/// Records domain events in the outbox from inside a business transaction.
///
/// The writer never opens or commits transactions and does no network I/O;
/// the caller passes the unit of work its business rows are written in.
#[derive(Clone)]
pub struct OutboxWriter<S> {
    store: S,
    environment: Environment,
    policy: WriteFailurePolicy,
    clock: Arc<MonotonicClock>,
}

impl<S: OutboxStore> OutboxWriter<S> {
    pub fn new(store: S, environment: Environment) -> Self {
        Self {
            store,
            environment,
            policy: WriteFailurePolicy::default(),
            clock: Arc::new(MonotonicClock::new()),
        }
    }

    pub fn with_failure_policy(mut self, policy: WriteFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Append one outbox entry per event to `tx`.
    ///
    /// Under [`WriteFailurePolicy::BestEffort`] a failure is logged and `Ok`
    /// is returned, so the events are lost while the business change still
    /// commits. Under [`WriteFailurePolicy::Strict`] the error is returned.
    pub async fn insert(
        &self,
        tx: &S::Tx,
        events: &[&dyn DomainEvent],
    ) -> Result<(), OutboxError> {
        let result = match self.to_entries(events) {
            Ok(entries) => self.store.append(tx, entries).await,
            Err(err) => Err(err),
        };
        match result {
            Ok(()) => Ok(()),
            Err(err) => match self.policy {
                WriteFailurePolicy::BestEffort => {
                    error!(
                        error = %err,
                        kind = err.kind(),
                        count = events.len(),
                        "unable to insert events to outbox"
                    );
                    Ok(())
                }
                WriteFailurePolicy::Strict => Err(err),
            },
        }
    }

    fn to_entries(&self, events: &[&dyn DomainEvent]) -> Result<Vec<NewOutboxEntry>, OutboxError> {
        events
            .iter()
            .map(|event| -> Result<NewOutboxEntry, OutboxError> {
                Ok(NewOutboxEntry {
                    event_type: event.event_type(),
                    occurred_at: self.clock.now(),
                    environment: self.environment.as_str().to_owned(),
                    payload: event.payload()?,
                })
            })
            .collect()
    }
}
