use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::OneTimeCode;
use crate::services::{AuthService, ServiceError, TokenPair};
use crate::store::{CodeStore, CredentialStore, StoreError};

/// Returned when a one-time code is successfully created.
#[derive(Debug, Clone, Serialize)]
pub struct OtcResult {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Runs the one-time-code handshake between master and slave apps.
///
/// State machine per code: Pending -> Claimed (claim wins) and
/// Pending/Claimed -> deleted (sweep). Claimed is absorbing: no claim
/// attempt ever succeeds twice for the same code.
#[derive(Clone)]
pub struct OtcService {
    codes: Arc<dyn CodeStore>,
    creds: Arc<dyn CredentialStore>,
    auth: AuthService,
    code_expiry_seconds: i64,
}

impl OtcService {
    pub fn new(
        codes: Arc<dyn CodeStore>,
        creds: Arc<dyn CredentialStore>,
        auth: AuthService,
        code_expiry_seconds: i64,
    ) -> Self {
        Self {
            codes,
            creds,
            auth,
            code_expiry_seconds,
        }
    }

    /// Generate a short-lived one-time code for a specific slave app.
    ///
    /// The caller must already be authenticated; `user_id` comes from
    /// their access token. Multiple pending codes per (user, app) are
    /// allowed; each is independently single-use.
    pub async fn exchange_code(
        &self,
        user_id: Uuid,
        app_id: Uuid,
    ) -> Result<OtcResult, ServiceError> {
        self.creds
            .find_app_by_id(app_id)
            .await?
            .ok_or(ServiceError::AppNotFound)?;

        if !self.creds.has_permission(user_id, app_id).await? {
            return Err(ServiceError::NoPermission);
        }

        // 6 random bytes -> 12 hex chars. Collision with a live code is
        // a store-level uniqueness failure, never an overwrite.
        let code_bytes: [u8; 6] = rand::thread_rng().gen();
        let code = hex::encode(code_bytes);

        let otc = OneTimeCode::new(user_id, app_id, code, self.code_expiry_seconds);

        match self.codes.insert(&otc).await {
            Ok(()) => {}
            Err(StoreError::DuplicateCode) => return Err(ServiceError::CodeGenerationFailed),
            Err(e) => return Err(e.into()),
        }

        tracing::info!(
            user_id = %user_id,
            app_id = %app_id,
            expires_at = %otc.expires_utc,
            "One-time code issued"
        );

        Ok(OtcResult {
            code: otc.code,
            expires_at: otc.expires_utc,
        })
    }

    /// Redeem a one-time code for a token pair.
    ///
    /// Missing, already-claimed and expired codes are indistinguishable
    /// to the caller. The claimed transition is a single conditional
    /// store update, so racing claims resolve to exactly one winner.
    pub async fn claim_token(
        &self,
        code: &str,
        package_id: &str,
    ) -> Result<TokenPair, ServiceError> {
        let otc = self
            .codes
            .find_by_code(code)
            .await?
            .ok_or(ServiceError::CodeExpiredOrClaimed)?;

        if !otc.is_claimable() {
            return Err(ServiceError::CodeExpiredOrClaimed);
        }

        let app = self
            .creds
            .find_app_by_package_id(package_id)
            .await?
            .ok_or(ServiceError::AppNotFound)?;

        // A slave app cannot redeem a code exchanged for a different
        // target app.
        if app.app_id != otc.app_id {
            return Err(ServiceError::AppMismatch);
        }

        if !self.codes.mark_claimed(code, Utc::now()).await? {
            // Lost the race, or expired between the read and the
            // update. Either way the code is spent.
            return Err(ServiceError::CodeExpiredOrClaimed);
        }

        tracing::info!(
            user_id = %otc.user_id,
            app_id = %otc.app_id,
            package_id = %package_id,
            "One-time code claimed"
        );

        self.auth.issue_for_user(otc.user_id).await
    }

    /// Delete every claimed or expired code. Safe to run concurrently
    /// with live claims; intended to be driven by a fixed-interval
    /// timer outside this service.
    pub async fn sweep_expired(&self) -> Result<u64, ServiceError> {
        let removed = self.codes.delete_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::debug!(removed, "Swept expired one-time codes");
        }
        Ok(removed)
    }
}
