use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::domain::events::UserCreated;
use crate::domain::repository::UserRepository;
use crate::domain::types::{User, validate_email};
use crate::error::UsersServiceError;

// ── CreateUser ───────────────────────────────────────────────────────────────

pub struct CreateUserInput {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

pub struct CreateUserUseCase<R: UserRepository> {
    pub repo: R,
}

impl<R: UserRepository> CreateUserUseCase<R> {
    /// Create the user and record a [`UserCreated`] event in the same transaction.
    pub async fn execute(&self, input: CreateUserInput) -> Result<User, UsersServiceError> {
        let email = input.email.trim().to_owned();
        if !validate_email(&email) {
            return Err(UsersServiceError::InvalidEmail);
        }
        if self.repo.find_by_email(&email).await?.is_some() {
            return Err(UsersServiceError::UserAlreadyExists);
        }

        let user = User {
            id: Uuid::now_v7(),
            email,
            first_name: input.first_name,
            last_name: input.last_name,
            created_at: Utc::now(),
        };
        let event = UserCreated {
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
        };
        self.repo.create_with_outbox(&user, &[&event]).await?;
        info!(user_id = %user.id, "user has been created");
        Ok(user)
    }
}
