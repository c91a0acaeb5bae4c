//! Password hashing and verification.
//!
//! The services only ever call `verify_password`; hashing exists for
//! seeding and tests. The newtypes keep plaintext out of debug output
//! paths that format request structs.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Newtype for a plaintext password.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Newtype for a stored password hash.
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash of a throwaway password that belongs to no account. Login
/// verifies against this when no account matches the email, so the
/// miss branch pays the same argon2 cost as a wrong password.
pub const THROWAWAY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$VE0e3g7DalWHgDwou3nuRA$uC6TER156UQpk0lNQ5+jHM0l5poVjPA1he/Tyn9J4Zw";

/// Hash a password with Argon2id and a random salt.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(PasswordHashString::new(hash))
}

/// Verify a password against a stored hash. Returns Err on mismatch.
pub fn verify_password(
    password: &Password,
    password_hash: &PasswordHashString,
) -> Result<(), anyhow::Error> {
    let parsed = PasswordHash::new(password_hash.as_str())
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

    Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed)
        .map_err(|_| anyhow::anyhow!("Password verification failed"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let password = Password::new("correct horse battery".to_string());
        let hash = hash_password(&password).expect("hashing failed");

        assert!(hash.as_str().starts_with("$argon2"));
        assert!(verify_password(&password, &hash).is_ok());
    }

    #[test]
    fn test_wrong_password_rejected() {
        let password = Password::new("correct horse battery".to_string());
        let hash = hash_password(&password).expect("hashing failed");

        let wrong = Password::new("incorrect horse".to_string());
        assert!(verify_password(&wrong, &hash).is_err());
    }

    #[test]
    fn test_throwaway_hash_is_well_formed() {
        // Must parse as a real argon2 hash, otherwise verification
        // against it short-circuits and the timing equalizer is moot.
        assert!(PasswordHash::new(THROWAWAY_HASH).is_ok());

        let password = Password::new("anything at all".to_string());
        let hash = PasswordHashString::new(THROWAWAY_HASH.to_string());
        assert!(verify_password(&password, &hash).is_err());
    }

    #[test]
    fn test_salted_hashes_differ() {
        let password = Password::new("correct horse battery".to_string());
        let h1 = hash_password(&password).expect("hashing failed");
        let h2 = hash_password(&password).expect("hashing failed");

        assert_ne!(h1.as_str(), h2.as_str());
        assert!(verify_password(&password, &h2).is_ok());
    }
}
