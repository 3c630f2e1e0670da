use std::future::Future;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::client::EventLogClient;
use crate::dispatcher::{DrainOutcome, OutboxDispatcher};
use crate::error::OutboxError;
use crate::store::OutboxStore;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Pause between drains once the outbox has been emptied.
    pub poll_interval: Duration,
    /// Fixed delay before a failed drain is retried.
    pub retry_delay: Duration,
    /// Retries per scheduled drain; `None` retries until it succeeds.
    pub max_retries: Option<u32>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            retry_delay: Duration::from_secs(10),
            max_retries: None,
        }
    }
}

/// Periodic trigger for an [`OutboxDispatcher`].
///
/// Owns scheduling and retry: the dispatcher only knows how to drain once.
/// Failures are logged and retried here, so the loop outlives any single
/// failing drain.
pub struct OutboxRelay<S, C> {
    dispatcher: OutboxDispatcher<S, C>,
    config: RelayConfig,
}

impl<S, C> OutboxRelay<S, C>
where
    S: OutboxStore,
    C: EventLogClient,
{
    pub fn new(dispatcher: OutboxDispatcher<S, C>, config: RelayConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Single drain with no retry, for wiring to an external scheduler.
    pub async fn drain_outbox_once(&self) -> Result<(), OutboxError> {
        self.dispatcher
            .drain_once()
            .await
            .map(|_| ())
            .inspect_err(|err| {
                error!(error = %err, kind = err.kind(), "failed to process outbox events");
            })
    }

    /// Drain once, retrying the whole invocation after `retry_delay` on
    /// retryable failures.
    pub async fn drain_with_retry(&self) -> Result<DrainOutcome, OutboxError> {
        let mut attempt: u32 = 0;
        loop {
            let err = match self.dispatcher.drain_once().await {
                Ok(outcome) => return Ok(outcome),
                Err(err) => err,
            };
            if !err.is_retryable() {
                error!(error = %err, kind = err.kind(), "failed to process outbox events");
                return Err(err);
            }
            attempt += 1;
            if self.config.max_retries.is_some_and(|max| attempt > max) {
                error!(error = %err, attempts = attempt, "giving up on outbox drain");
                return Err(err);
            }
            warn!(
                error = %err,
                attempt,
                retry_in_secs = self.config.retry_delay.as_secs_f64(),
                "failed to process outbox events, retrying"
            );
            tokio::time::sleep(self.config.retry_delay).await;
        }
    }

    /// Drain on a fixed cadence until `shutdown` resolves.
    ///
    /// A full batch is followed by another drain straight away so a backlog
    /// empties without waiting a poll interval per batch.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let batch_size = self.dispatcher.batch_size().get();
        info!(
            batch_size,
            poll_interval_secs = self.config.poll_interval.as_secs_f64(),
            "outbox relay started"
        );

        loop {
            let outcome = tokio::select! {
                _ = &mut shutdown => break,
                outcome = self.drain_with_retry() => outcome,
            };
            if let Ok(DrainOutcome::Shipped(n)) = outcome {
                if n as u64 >= batch_size {
                    continue;
                }
            }
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        info!("outbox relay stopped");
    }
}
