use tokio::sync::watch;

use beacon_outbox::{EventLogClient, OutboxRelay, OutboxStore};

/// Fires [`Shutdown`] for every holder once.
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Resolves when the paired [`ShutdownTrigger`] fires or is dropped.
#[derive(Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

pub fn channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

impl Shutdown {
    pub async fn wait(mut self) {
        // Err means the trigger is gone, which also ends the process.
        let _ = self.rx.wait_for(|stopped| *stopped).await;
    }
}

/// Run the outbox relay in-process until `shutdown` fires.
pub async fn run_embedded_relay<S, C>(relay: OutboxRelay<S, C>, shutdown: Shutdown)
where
    S: OutboxStore,
    C: EventLogClient,
{
    relay.run_until(shutdown.wait()).await;
}
