use thiserror::Error;

/// Validation and invariant failures raised by domain entities
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Username cannot be blank")]
    BlankUsername,

    #[error("Password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("Invalid status {0}: must be 0 (deleted) or 10 (active)")]
    InvalidStatus(i16),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}
