//! In-memory store implementations for tests.
//!
//! `MemoryCodeStore` performs the check-and-flip of `mark_claimed`
//! under a single mutex guard, so it honors the same at-most-one-winner
//! contract as the SQL conditional update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CodeStore, CredentialStore, StoreError};
use crate::models::{App, AppPermission, OneTimeCode, User};

#[derive(Default)]
struct Credentials {
    users: Vec<User>,
    apps: Vec<App>,
    permissions: Vec<AppPermission>,
}

/// In-memory credential store.
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    inner: Arc<Mutex<Credentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_user(&self, user: User) {
        self.inner.lock().await.users.push(user);
    }

    pub async fn add_app(&self, app: App) {
        self.inner.lock().await.apps.push(app);
    }

    pub async fn grant_permission(&self, user_id: Uuid, app_id: Uuid) {
        self.inner
            .lock()
            .await
            .permissions
            .push(AppPermission::new(user_id, app_id));
    }

    pub async fn remove_user(&self, user_id: Uuid) {
        self.inner.lock().await.users.retain(|u| u.user_id != user_id);
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_user_by_id(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.user_id == user_id).cloned())
    }

    async fn find_app_by_id(&self, app_id: Uuid) -> Result<Option<App>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.apps.iter().find(|a| a.app_id == app_id).cloned())
    }

    async fn find_app_by_package_id(&self, package_id: &str) -> Result<Option<App>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.apps.iter().find(|a| a.package_id == package_id).cloned())
    }

    async fn has_permission(&self, user_id: Uuid, app_id: Uuid) -> Result<bool, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .permissions
            .iter()
            .any(|p| p.user_id == user_id && p.app_id == app_id))
    }

    async fn list_permitted_apps(&self, user_id: Uuid) -> Result<Vec<App>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .apps
            .iter()
            .filter(|a| {
                inner
                    .permissions
                    .iter()
                    .any(|p| p.user_id == user_id && p.app_id == a.app_id)
            })
            .cloned()
            .collect())
    }
}

/// In-memory code store, keyed by code value.
#[derive(Clone, Default)]
pub struct MemoryCodeStore {
    inner: Arc<Mutex<HashMap<String, OneTimeCode>>>,
}

impl MemoryCodeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.is_empty()
    }
}

#[async_trait]
impl CodeStore for MemoryCodeStore {
    async fn insert(&self, code: &OneTimeCode) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.contains_key(&code.code) {
            return Err(StoreError::DuplicateCode);
        }
        inner.insert(code.code.clone(), code.clone());
        Ok(())
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<OneTimeCode>, StoreError> {
        let inner = self.inner.lock().await;
        Ok(inner.get(code).cloned())
    }

    async fn mark_claimed(&self, code: &str, now: DateTime<Utc>) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().await;
        match inner.get_mut(code) {
            Some(record) if !record.claimed && record.expires_utc > now => {
                record.claimed = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.len();
        inner.retain(|_, c| !c.claimed && c.expires_utc >= now);
        Ok((before - inner.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_code_insert_rejected() {
        let store = MemoryCodeStore::new();
        let first = OneTimeCode::new(Uuid::new_v4(), Uuid::new_v4(), "c0ffeec0ffee".into(), 30);
        store.insert(&first).await.unwrap();

        let second = OneTimeCode::new(Uuid::new_v4(), Uuid::new_v4(), "c0ffeec0ffee".into(), 30);
        assert!(matches!(
            store.insert(&second).await,
            Err(StoreError::DuplicateCode)
        ));

        // The colliding insert must not overwrite the original record.
        let stored = store.find_by_code("c0ffeec0ffee").await.unwrap().unwrap();
        assert_eq!(stored.otc_id, first.otc_id);
        assert_eq!(stored.user_id, first.user_id);
        assert_eq!(store.len().await, 1);
    }
}
