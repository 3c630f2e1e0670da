use serde::Serialize;

/// Emitted once a user row is committed.
#[derive(Debug, Clone, Serialize)]
pub struct UserCreated {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

beacon_outbox::domain_event!(UserCreated);
