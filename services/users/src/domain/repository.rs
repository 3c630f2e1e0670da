#![allow(async_fn_in_trait)]

use beacon_outbox::DomainEvent;

use crate::domain::types::User;
use crate::error::UsersServiceError;

/// Repository for users.
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, UsersServiceError>;

    /// Insert `user` and record `events` in the outbox within one transaction.
    async fn create_with_outbox(
        &self,
        user: &User,
        events: &[&dyn DomainEvent],
    ) -> Result<(), UsersServiceError>;
}
