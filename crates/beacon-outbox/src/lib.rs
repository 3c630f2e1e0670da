//! Transactional outbox: record domain events in the same database
//! transaction as the business change, then drain them into an external
//! event log with at-least-once delivery.
//!
//! - [`OutboxWriter`] appends entries inside the caller's transaction.
//! - [`OutboxStore`] is the durable table ([`DbOutboxStore`], [`MemoryOutboxStore`]).
//! - [`OutboxDispatcher`] ships one bounded batch per invocation.
//! - [`OutboxRelay`] schedules drains and retries failed ones.

pub mod clickhouse;
pub mod client;
pub mod clock;
pub mod config;
pub mod db;
pub mod dispatcher;
pub mod entry;
pub mod error;
pub mod event;
pub mod memory;
pub mod relay;
pub mod schema;
pub mod store;
pub mod writer;

pub use client::{EventLogClient, EventLogConnection, EventLogRow};
pub use config::{BatchSize, Environment, OutboxConfig, WriteFailurePolicy};
pub use db::DbOutboxStore;
pub use dispatcher::{DispatcherConfig, DrainOutcome, OutboxDispatcher};
pub use entry::{NewOutboxEntry, OutboxEntry, OutboxId};
pub use error::OutboxError;
pub use event::{DomainEvent, to_event_type};
pub use memory::{MemoryOutboxStore, MemoryTx};
pub use relay::{OutboxRelay, RelayConfig};
pub use store::OutboxStore;
pub use writer::OutboxWriter;

#[doc(hidden)]
pub mod __private {
    pub use serde_json;
}
