use axum::extract::FromRef;
use sea_orm::DatabaseConnection;

use beacon_outbox::{DbOutboxStore, OutboxWriter};

use crate::infra::db::DbUserRepository;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone, FromRef)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub outbox: OutboxWriter<DbOutboxStore>,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
            outbox: self.outbox.clone(),
        }
    }
}
