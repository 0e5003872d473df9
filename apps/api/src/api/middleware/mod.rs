// Request filters applied to protected routes

pub mod auth;
pub mod rate_limit;

pub use auth::{authenticate, CurrentUser};
pub use rate_limit::rate_limit;
