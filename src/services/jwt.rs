use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::JwtConfig;
use crate::models::User;
use crate::services::ServiceError;

/// Token kind tag embedded in the signed payload.
///
/// Tagging inside the signature (rather than relying on which endpoint
/// a token arrives at) keeps a captured refresh token from standing in
/// for an access token and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// Claims carried by both token kinds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Email
    pub email: String,
    /// Token kind ("access" or "refresh")
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issuer
    pub iss: String,
}

/// Access + refresh token pair returned to clients.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// JWT service for token pair generation and validation.
///
/// Stateless: a pure function of the signing secret, the claims, and
/// the clock. Safe to clone into every handler.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    access_token_expiry_minutes: i64,
    refresh_token_expiry_days: i64,
}

impl JwtService {
    /// Create a new JWT service from a symmetric HS256 secret.
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            issuer: config.issuer.clone(),
            access_token_expiry_minutes: config.access_token_expiry_minutes,
            refresh_token_expiry_days: config.refresh_token_expiry_days,
        }
    }

    /// Issue an access + refresh pair for a user. The two tokens share
    /// identity but carry different kind tags and expiry horizons.
    pub fn issue_pair(&self, user: &User) -> Result<TokenPair, ServiceError> {
        let now = Utc::now();

        let access_token = self.sign(Claims {
            sub: user.user_id,
            email: user.email.clone(),
            kind: TokenKind::Access,
            iat: now.timestamp(),
            exp: (now + Duration::minutes(self.access_token_expiry_minutes)).timestamp(),
            iss: self.issuer.clone(),
        })?;

        let refresh_token = self.sign(Claims {
            sub: user.user_id,
            email: user.email.clone(),
            kind: TokenKind::Refresh,
            iat: now.timestamp(),
            exp: (now + Duration::days(self.refresh_token_expiry_days)).timestamp(),
            iss: self.issuer.clone(),
        })?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Validate a token and require the access kind.
    pub fn verify_access(&self, token: &str) -> Result<Claims, ServiceError> {
        self.verify_kind(token, TokenKind::Access)
    }

    /// Validate a token and require the refresh kind.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, ServiceError> {
        self.verify_kind(token, TokenKind::Refresh)
    }

    /// Access token expiry in seconds (for the expires_in response field).
    pub fn access_token_expiry_seconds(&self) -> i64 {
        self.access_token_expiry_minutes * 60
    }

    fn sign(&self, claims: Claims) -> Result<String, ServiceError> {
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| ServiceError::Signing(anyhow::anyhow!("Failed to sign token: {}", e)))
    }

    fn verify_kind(&self, token: &str, expected: TokenKind) -> Result<Claims, ServiceError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_issuer(&[&self.issuer]);

        // Malformed, tampered, wrong-issuer and expired all collapse to
        // one error so callers cannot probe which check failed.
        let data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|_| ServiceError::InvalidOrExpiredToken)?;

        if data.claims.kind != expected {
            return Err(ServiceError::InvalidTokenType);
        }

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> JwtService {
        JwtService::new(&JwtConfig {
            secret: "unit-test-secret".to_string(),
            issuer: "companion-auth".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        })
    }

    fn test_user() -> User {
        User::new("test@example.com".to_string(), "hash".to_string())
    }

    #[test]
    fn test_pair_round_trip() {
        let service = test_service();
        let user = test_user();

        let pair = service.issue_pair(&user).expect("issue failed");

        let access = service.verify_access(&pair.access_token).expect("access invalid");
        assert_eq!(access.sub, user.user_id);
        assert_eq!(access.email, user.email);
        assert_eq!(access.kind, TokenKind::Access);

        let refresh = service.verify_refresh(&pair.refresh_token).expect("refresh invalid");
        assert_eq!(refresh.sub, user.user_id);
        assert_eq!(refresh.kind, TokenKind::Refresh);
    }

    #[test]
    fn test_kind_separation() {
        let service = test_service();
        let pair = service.issue_pair(&test_user()).expect("issue failed");

        assert!(matches!(
            service.verify_access(&pair.refresh_token),
            Err(ServiceError::InvalidTokenType)
        ));
        assert!(matches!(
            service.verify_refresh(&pair.access_token),
            Err(ServiceError::InvalidTokenType)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = test_service();
        let user = test_user();
        let now = Utc::now();

        let expired = encode(
            &Header::new(Algorithm::HS256),
            &Claims {
                sub: user.user_id,
                email: user.email.clone(),
                kind: TokenKind::Access,
                iat: (now - Duration::minutes(30)).timestamp(),
                exp: (now - Duration::minutes(15)).timestamp(),
                iss: "companion-auth".to_string(),
            },
            &EncodingKey::from_secret(b"unit-test-secret"),
        )
        .unwrap();

        // Valid signature, past expiry: still collapses to the single
        // invalid-or-expired error.
        assert!(matches!(
            service.verify_access(&expired),
            Err(ServiceError::InvalidOrExpiredToken)
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = test_service();
        let other = JwtService::new(&JwtConfig {
            secret: "a-different-secret".to_string(),
            issuer: "companion-auth".to_string(),
            access_token_expiry_minutes: 15,
            refresh_token_expiry_days: 7,
        });

        let pair = other.issue_pair(&test_user()).expect("issue failed");
        assert!(matches!(
            service.verify_access(&pair.access_token),
            Err(ServiceError::InvalidOrExpiredToken)
        ));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = test_service();
        assert!(matches!(
            service.verify_access("not.a.jwt"),
            Err(ServiceError::InvalidOrExpiredToken)
        ));
    }
}
