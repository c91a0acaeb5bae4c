//! Services layer.
//!
//! Business logic for authentication, token issuance, and the
//! one-time-code handshake.

pub mod auth;
pub mod error;
pub mod jwt;
pub mod otc;

pub use auth::AuthService;
pub use error::ServiceError;
pub use jwt::{Claims, JwtService, TokenKind, TokenPair};
pub use otc::{OtcResult, OtcService};
