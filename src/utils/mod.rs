pub mod password;
pub mod validation;

pub use password::{hash_password, verify_password, Password, PasswordHashString, THROWAWAY_HASH};
pub use validation::ValidatedJson;
