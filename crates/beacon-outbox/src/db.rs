use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait, sea_query::Expr,
};
use tracing::warn;

use crate::entry::{NewOutboxEntry, OutboxEntry, OutboxId};
use crate::error::OutboxError;
use crate::schema::event_outbox;
use crate::store::OutboxStore;

/// Outbox store backed by the `event_outbox` table.
///
/// Appends only accept a [`DatabaseTransaction`], so outbox rows are always
/// written in the same transaction as the business rows that caused them.
#[derive(Clone)]
pub struct DbOutboxStore {
    pub db: DatabaseConnection,
}

impl DbOutboxStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl OutboxStore for DbOutboxStore {
    type Tx = DatabaseTransaction;

    async fn append(
        &self,
        txn: &DatabaseTransaction,
        entries: Vec<NewOutboxEntry>,
    ) -> Result<(), OutboxError> {
        if entries.is_empty() {
            return Ok(());
        }
        let models = entries.into_iter().map(|entry| event_outbox::ActiveModel {
            event_type: Set(entry.event_type),
            event_date_time: Set(entry.occurred_at),
            environment: Set(entry.environment),
            event_context: Set(entry.payload),
            processed: Set(false),
            processed_at: Set(None),
            ..Default::default()
        });
        // A failed statement poisons the enclosing transaction on Postgres, so
        // the insert runs in a savepoint the caller's work survives.
        let savepoint = txn
            .begin()
            .await
            .context("open outbox savepoint")
            .map_err(OutboxError::Persistence)?;
        if let Err(e) = event_outbox::Entity::insert_many(models)
            .exec(&savepoint)
            .await
        {
            if let Err(rollback_err) = savepoint.rollback().await {
                warn!(error = %rollback_err, "failed to roll back outbox savepoint");
            }
            return Err(OutboxError::Persistence(
                anyhow::Error::new(e).context("append outbox entries"),
            ));
        }
        savepoint
            .commit()
            .await
            .context("release outbox savepoint")
            .map_err(OutboxError::Persistence)?;
        Ok(())
    }

    async fn select_pending(&self, limit: u64) -> Result<Vec<OutboxEntry>, OutboxError> {
        let models = event_outbox::Entity::find()
            .filter(event_outbox::Column::Processed.eq(false))
            .order_by_asc(event_outbox::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .context("select pending outbox entries")
            .map_err(OutboxError::Persistence)?;
        Ok(models.into_iter().map(entry_from_model).collect())
    }

    async fn mark_processed(
        &self,
        ids: &[OutboxId],
        at: DateTime<Utc>,
    ) -> Result<(), OutboxError> {
        if ids.is_empty() {
            return Ok(());
        }
        // `processed = false` keeps the first processed_at on re-marks.
        event_outbox::Entity::update_many()
            .col_expr(event_outbox::Column::Processed, Expr::value(true))
            .col_expr(event_outbox::Column::ProcessedAt, Expr::value(at))
            .filter(event_outbox::Column::Id.is_in(ids.iter().copied()))
            .filter(event_outbox::Column::Processed.eq(false))
            .exec(&self.db)
            .await
            .context("mark outbox entries processed")
            .map_err(OutboxError::Persistence)?;
        Ok(())
    }
}

fn entry_from_model(model: event_outbox::Model) -> OutboxEntry {
    OutboxEntry {
        id: model.id,
        event_type: model.event_type,
        occurred_at: model.event_date_time,
        environment: model.environment,
        payload: model.event_context,
        processed: model.processed,
        processed_at: model.processed_at,
    }
}
