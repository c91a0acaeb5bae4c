//! PostgreSQL store implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPool;
use uuid::Uuid;

use super::{CodeStore, CredentialStore, StoreError};
use crate::models::{App, OneTimeCode, User};

const UNIQUE_VIOLATION: &str = "23505";

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(anyhow::anyhow!(e))
}

/// Credential store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE LOWER(email) = LOWER($1)")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)
    }

    async fn find_app_by_id(&self, app_id: Uuid) -> Result<Option<App>, StoreError> {
        sqlx::query_as::<_, App>("SELECT * FROM app_registry WHERE app_id = $1")
            .bind(app_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)
    }

    async fn find_app_by_package_id(&self, package_id: &str) -> Result<Option<App>, StoreError> {
        sqlx::query_as::<_, App>("SELECT * FROM app_registry WHERE package_id = $1")
            .bind(package_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)
    }

    async fn has_permission(&self, user_id: Uuid, app_id: Uuid) -> Result<bool, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM user_app_permissions WHERE user_id = $1 AND app_id = $2",
        )
        .bind(user_id)
        .bind(app_id)
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        Ok(count > 0)
    }

    async fn list_permitted_apps(&self, user_id: Uuid) -> Result<Vec<App>, StoreError> {
        sqlx::query_as::<_, App>(
            r#"
            SELECT a.* FROM app_registry a
            JOIN user_app_permissions p ON p.app_id = a.app_id
            WHERE p.user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }
}

/// Code store backed by PostgreSQL.
#[derive(Clone)]
pub struct PgCodeStore {
    pool: PgPool,
}

impl PgCodeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CodeStore for PgCodeStore {
    async fn insert(&self, code: &OneTimeCode) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO one_time_codes (otc_id, user_id, app_id, code, expires_utc, claimed, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(code.otc_id)
        .bind(code.user_id)
        .bind(code.app_id)
        .bind(&code.code)
        .bind(code.expires_utc)
        .bind(code.claimed)
        .bind(code.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| match e.as_database_error().and_then(|d| d.code()) {
            Some(code) if code == UNIQUE_VIOLATION => StoreError::DuplicateCode,
            _ => backend(e),
        })?;
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<OneTimeCode>, StoreError> {
        sqlx::query_as::<_, OneTimeCode>("SELECT * FROM one_time_codes WHERE code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)
    }

    async fn mark_claimed(&self, code: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        // Single conditional update: the row guard makes concurrent
        // claims resolve to exactly one winner.
        let result = sqlx::query(
            r#"
            UPDATE one_time_codes
            SET claimed = TRUE
            WHERE code = $1 AND claimed = FALSE AND expires_utc > $2
            "#,
        )
        .bind(code)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let result =
            sqlx::query("DELETE FROM one_time_codes WHERE claimed = TRUE OR expires_utc < $1")
                .bind(now)
                .execute(&self.pool)
                .await
                .map_err(backend)?;

        Ok(result.rows_affected())
    }
}
