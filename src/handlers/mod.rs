pub mod auth;
pub mod otc;
