use thiserror::Error;

use crate::error::AppError;
use crate::store::StoreError;

/// Business-logic failures.
///
/// Security-sensitive distinctions are deliberately collapsed: a caller
/// cannot tell a missing user from a wrong password, a tampered token
/// from an expired one, or a nonexistent code from an already-claimed
/// one.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("user not found")]
    UserNotFound,

    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    #[error("invalid token type")]
    InvalidTokenType,

    #[error("application not found")]
    AppNotFound,

    #[error("user does not have permission for this application")]
    NoPermission,

    #[error("code does not match the requested application")]
    AppMismatch,

    #[error("code expired or already claimed")]
    CodeExpiredOrClaimed,

    #[error("failed to generate one-time code")]
    CodeGenerationFailed,

    #[error("token signing failed: {0}")]
    Signing(anyhow::Error),

    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::InvalidCredentials
            | ServiceError::UserNotFound
            | ServiceError::InvalidOrExpiredToken
            | ServiceError::InvalidTokenType
            | ServiceError::CodeExpiredOrClaimed => {
                AppError::Unauthorized(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::AppNotFound => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            ServiceError::NoPermission | ServiceError::AppMismatch => {
                AppError::Forbidden(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::CodeGenerationFailed => {
                AppError::InternalError(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::Signing(e) => AppError::InternalError(e),
            ServiceError::Store(e) => AppError::DatabaseError(anyhow::anyhow!(e)),
        }
    }
}
