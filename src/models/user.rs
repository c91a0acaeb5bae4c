//! User model - master-app accounts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// User entity. Identity is immutable once created; the core never
/// mutates these rows.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_utc: DateTime<Utc>,
}

impl User {
    /// Create a new user with a freshly hashed password.
    pub fn new(email: String, password_hash: String) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email,
            password_hash,
            created_utc: Utc::now(),
        }
    }
}

/// Public profile returned by verify (no sensitive fields).
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub authorized_apps: Vec<Uuid>,
}
