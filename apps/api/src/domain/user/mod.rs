// User domain module
// Identity, credentials, and rate-limit bookkeeping

#![allow(clippy::module_inception)]

pub mod user;
pub mod value_objects;

pub use user::{is_password_reset_token_valid, User, MIN_PASSWORD_LENGTH};
pub use value_objects::{Email, UserStatus};
