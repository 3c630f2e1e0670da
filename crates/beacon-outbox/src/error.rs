/// Errors raised by the outbox store, writer, dispatcher and event log client.
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    /// The outbox store could not durably record or update entries.
    #[error("outbox persistence failed: {0}")]
    Persistence(#[source] anyhow::Error),
    /// The event log rejected the batch or did not answer in time.
    #[error("event log delivery failed: {0}")]
    TransientDelivery(#[source] anyhow::Error),
    /// Missing or invalid startup configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("failed to serialize event payload")]
    Serialization(#[from] serde_json::Error),
}

impl OutboxError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Persistence(_) => "PERSISTENCE",
            Self::TransientDelivery(_) => "TRANSIENT_DELIVERY",
            Self::Configuration(_) => "CONFIGURATION",
            Self::Serialization(_) => "SERIALIZATION",
        }
    }

    /// Whether a whole dispatcher invocation failing with this error should be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::TransientDelivery(_))
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

impl From<sea_orm::DbErr> for OutboxError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Persistence(err.into())
    }
}
