pub mod app;
pub mod one_time_code;
pub mod user;

pub use app::{App, AppPermission};
pub use one_time_code::OneTimeCode;
pub use user::{User, UserProfile};
