//! Storage capability boundaries.
//!
//! The services consume these traits as `Arc<dyn ...>`; the concrete
//! backend is PostgreSQL in production and an in-memory store in tests.

mod memory;
mod postgres;

pub use memory::{MemoryCodeStore, MemoryCredentialStore};
pub use postgres::{PgCodeStore, PgCredentialStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{App, OneTimeCode, User};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The code value collided with an existing row. The uniqueness
    /// constraint lives in the store, not the generator.
    #[error("duplicate code value")]
    DuplicateCode,

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Durable records of users, registered apps, and user<->app grants.
/// Lookups only; the core never writes through this boundary.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_app_by_id(&self, app_id: Uuid) -> Result<Option<App>, StoreError>;

    async fn find_app_by_package_id(&self, package_id: &str) -> Result<Option<App>, StoreError>;

    async fn has_permission(&self, user_id: Uuid, app_id: Uuid) -> Result<bool, StoreError>;

    async fn list_permitted_apps(&self, user_id: Uuid) -> Result<Vec<App>, StoreError>;
}

/// Durable one-time-code records.
#[async_trait]
pub trait CodeStore: Send + Sync {
    /// Persist a new pending code. Fails with `DuplicateCode` if the
    /// code value already exists.
    async fn insert(&self, code: &OneTimeCode) -> Result<(), StoreError>;

    async fn find_by_code(&self, code: &str) -> Result<Option<OneTimeCode>, StoreError>;

    /// Atomically flip `claimed` false -> true, but only while the row
    /// is still pending and unexpired as of `now`. Returns whether this
    /// caller won the transition. Concurrent claim attempts for the
    /// same code must observe at most one `true`.
    async fn mark_claimed(&self, code: &str, now: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Delete every row that is claimed or past expiry as of `now`.
    /// Returns the number of rows removed. Idempotent.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
