//! One-time code model - the single-use handshake artifact.

use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// A one-time code binding a user to a target app.
///
/// The row is mutated exactly once: `claimed` flips false -> true on a
/// successful claim. Both the flag and the expiry timestamp are
/// authoritative; either one failing the check makes the code
/// permanently unusable, even before the sweep deletes the row.
#[derive(Debug, Clone, FromRow)]
pub struct OneTimeCode {
    pub otc_id: Uuid,
    pub user_id: Uuid,
    pub app_id: Uuid,
    pub code: String,
    pub expires_utc: DateTime<Utc>,
    pub claimed: bool,
    pub created_utc: DateTime<Utc>,
}

impl OneTimeCode {
    /// Create a new pending code expiring `expiry_seconds` from now.
    pub fn new(user_id: Uuid, app_id: Uuid, code: String, expiry_seconds: i64) -> Self {
        let now = Utc::now();
        Self {
            otc_id: Uuid::new_v4(),
            user_id,
            app_id,
            code,
            expires_utc: now + Duration::seconds(expiry_seconds),
            claimed: false,
            created_utc: now,
        }
    }

    /// Check if the code has reached its expiry timestamp. A code is
    /// usable strictly before `expires_utc`, matching the store guard.
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_utc
    }

    /// Check if the code can still be claimed (pending and unexpired).
    pub fn is_claimable(&self) -> bool {
        !self.claimed && !self.is_expired()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_code_is_claimable() {
        let code = OneTimeCode::new(Uuid::new_v4(), Uuid::new_v4(), "deadbeef1234".into(), 30);

        assert!(!code.claimed);
        assert!(!code.is_expired());
        assert!(code.is_claimable());
    }

    #[test]
    fn test_claimed_code_is_not_claimable() {
        let mut code = OneTimeCode::new(Uuid::new_v4(), Uuid::new_v4(), "deadbeef1234".into(), 30);

        code.claimed = true;
        assert!(!code.is_claimable());
        assert!(!code.is_expired());
    }

    #[test]
    fn test_code_at_expiry_instant_is_expired() {
        let mut code = OneTimeCode::new(Uuid::new_v4(), Uuid::new_v4(), "deadbeef1234".into(), 30);

        // Usable strictly before expires_utc, so the boundary instant
        // itself is already spent.
        code.expires_utc = Utc::now();
        assert!(code.is_expired());
        assert!(!code.is_claimable());
    }

    #[test]
    fn test_expired_code_is_not_claimable() {
        let mut code = OneTimeCode::new(Uuid::new_v4(), Uuid::new_v4(), "deadbeef1234".into(), 30);

        code.expires_utc = Utc::now() - Duration::seconds(1);
        assert!(code.is_expired());
        assert!(!code.is_claimable());
    }
}
