use std::sync::Arc;
use uuid::Uuid;

use crate::models::UserProfile;
use crate::services::{JwtService, ServiceError, TokenPair};
use crate::store::CredentialStore;
use crate::utils::{verify_password, Password, PasswordHashString, THROWAWAY_HASH};

/// Handles login, token verification, and token refresh.
#[derive(Clone)]
pub struct AuthService {
    creds: Arc<dyn CredentialStore>,
    jwt: JwtService,
}

impl AuthService {
    pub fn new(creds: Arc<dyn CredentialStore>, jwt: JwtService) -> Self {
        Self { creds, jwt }
    }

    /// Validate credentials and return a fresh token pair.
    ///
    /// Unknown email and wrong password are indistinguishable to the
    /// caller, in both response and hashing cost.
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, ServiceError> {
        let user = match self.creds.find_user_by_email(email).await? {
            Some(user) => user,
            None => {
                // Burn a verification against a hash that matches no
                // account, so a miss takes as long as a mismatch.
                let _ = verify_password(
                    &Password::new(password.to_string()),
                    &PasswordHashString::new(THROWAWAY_HASH.to_string()),
                );
                return Err(ServiceError::InvalidCredentials);
            }
        };

        verify_password(
            &Password::new(password.to_string()),
            &PasswordHashString::new(user.password_hash.clone()),
        )
        .map_err(|_| ServiceError::InvalidCredentials)?;

        tracing::info!(user_id = %user.user_id, "User logged in");

        self.jwt.issue_pair(&user)
    }

    /// Resolve the profile for an authenticated user: identity plus
    /// the apps they are authorized to hand codes to. The access token
    /// itself is verified upstream by the auth middleware.
    pub async fn profile(&self, user_id: Uuid) -> Result<UserProfile, ServiceError> {
        let user = self
            .creds
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        let apps = self.creds.list_permitted_apps(user.user_id).await?;

        Ok(UserProfile {
            id: user.user_id,
            email: user.email,
            authorized_apps: apps.into_iter().map(|a| a.app_id).collect(),
        })
    }

    /// Validate a refresh token and mint a new pair.
    ///
    /// The user is re-resolved from the credential store so a deleted
    /// account cannot keep refreshing a stale session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ServiceError> {
        let claims = self.jwt.verify_refresh(refresh_token)?;

        let user = self
            .creds
            .find_user_by_id(claims.sub)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        tracing::info!(user_id = %user.user_id, "Token pair refreshed");

        self.jwt.issue_pair(&user)
    }

    /// Mint a token pair for a user resolved by id. Used by the OTC
    /// claim path, where the code record carries the owning user.
    pub async fn issue_for_user(&self, user_id: Uuid) -> Result<TokenPair, ServiceError> {
        let user = self
            .creds
            .find_user_by_id(user_id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        self.jwt.issue_pair(&user)
    }
}
