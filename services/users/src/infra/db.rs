use anyhow::Context as _;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    SqlErr, TransactionTrait,
};

use beacon_outbox::{DbOutboxStore, DomainEvent, OutboxWriter};
use beacon_users_schema::users;

use crate::domain::repository::UserRepository;
use crate::domain::types::User;
use crate::error::UsersServiceError;

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
    pub outbox: OutboxWriter<DbOutboxStore>,
}

impl UserRepository for DbUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UsersServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        Ok(model.map(user_from_model))
    }

    async fn create_with_outbox(
        &self,
        user: &User,
        events: &[&dyn DomainEvent],
    ) -> Result<(), UsersServiceError> {
        let txn = self
            .db
            .begin()
            .await
            .context("begin create user transaction")?;

        let inserted = users::ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            created_at: Set(user.created_at),
        }
        .insert(&txn)
        .await;
        if let Err(e) = inserted {
            // Lost a race with a concurrent signup for the same email.
            if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                return Err(UsersServiceError::UserAlreadyExists);
            }
            return Err(anyhow::Error::new(e).context("create user").into());
        }

        self.outbox.insert(&txn, events).await?;

        txn.commit().await.context("commit create user")?;
        Ok(())
    }
}

fn user_from_model(model: users::Model) -> User {
    User {
        id: model.id,
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
        created_at: model.created_at,
    }
}
