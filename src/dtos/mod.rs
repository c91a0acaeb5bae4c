//! Request and response DTOs for the HTTP surface.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::services::TokenPair;

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body for POST /auth/login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
}

/// Body for POST /auth/refresh.
#[derive(Debug, Deserialize, Validate)]
pub struct RefreshRequest {
    #[validate(length(min = 1))]
    pub refresh_token: String,
}

/// Body for POST /auth/exchange-code.
#[derive(Debug, Deserialize, Validate)]
pub struct ExchangeCodeRequest {
    pub app_id: Uuid,
}

/// Body for POST /auth/claim-token.
#[derive(Debug, Deserialize, Validate)]
pub struct ClaimTokenRequest {
    #[validate(length(min = 1))]
    pub code: String,
    #[validate(length(min = 1))]
    pub package_id: String,
}

/// Token pair response after a successful login, refresh, or claim.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

impl TokenResponse {
    pub fn new(pair: TokenPair, expires_in: i64) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: "Bearer".to_string(),
            expires_in,
        }
    }
}
