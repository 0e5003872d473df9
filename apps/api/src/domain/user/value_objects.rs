use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::errors::DomainError;

/// Email value object representing a valid email address
///
/// # Invariants
/// - Must contain '@' character
/// - Must be at least 3 characters long
/// - Is immutable after construction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Creates a new Email value object
    ///
    /// Surrounding whitespace is trimmed before validation.
    ///
    /// # Example
    /// ```
    /// use token_api::domain::user::value_objects::Email;
    ///
    /// let email = Email::new("test@example.com").expect("valid email");
    /// assert_eq!(email.as_str(), "test@example.com");
    /// ```
    pub fn new(email: impl Into<String>) -> Result<Self, DomainError> {
        let email = email.into().trim().to_string();
        if Self::is_valid(&email) {
            Ok(Email(email))
        } else {
            Err(DomainError::InvalidEmail(email))
        }
    }

    fn is_valid(email: &str) -> bool {
        email.contains('@') && email.len() >= 3
    }

    /// Returns the email as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Lifecycle status of a user account
///
/// Persisted as the numeric codes `10` (active) and `0` (deleted).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Soft-deleted; cannot authenticate
    Deleted,
    /// Default status for new accounts
    #[default]
    Active,
}

impl UserStatus {
    pub const DELETED_CODE: i16 = 0;
    pub const ACTIVE_CODE: i16 = 10;

    /// Numeric code stored in the database
    pub const fn code(self) -> i16 {
        match self {
            UserStatus::Deleted => Self::DELETED_CODE,
            UserStatus::Active => Self::ACTIVE_CODE,
        }
    }

    /// Parses a stored status code, rejecting anything outside the known range
    ///
    /// # Example
    /// ```
    /// use token_api::domain::user::value_objects::UserStatus;
    ///
    /// assert_eq!(UserStatus::from_code(10), Ok(UserStatus::Active));
    /// assert!(UserStatus::from_code(5).is_err());
    /// ```
    pub fn from_code(code: i16) -> Result<Self, DomainError> {
        match code {
            Self::ACTIVE_CODE => Ok(UserStatus::Active),
            Self::DELETED_CODE => Ok(UserStatus::Deleted),
            other => Err(DomainError::InvalidStatus(other)),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Deleted => write!(f, "deleted"),
            UserStatus::Active => write!(f, "active"),
        }
    }
}
