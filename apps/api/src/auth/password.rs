// Password hashing utilities
// Uses bcrypt for secure password hashing

use bcrypt::{hash, verify};

use crate::domain::errors::DomainError;

/// Hashes a password using bcrypt
///
/// # Arguments
/// * `password` - The plaintext password to hash
/// * `cost` - The bcrypt cost factor (4..=31)
///
/// # Returns
/// * `Ok(String)` - The bcrypt hash
/// * `Err(DomainError::PasswordHash)` - If hashing fails
///
/// # Example
/// ```
/// use token_api::auth::password::hash_password;
///
/// let hash = hash_password("my_password", 4).expect("valid hash");
/// assert!(hash.starts_with("$2"));
/// ```
pub fn hash_password(password: &str, cost: u32) -> Result<String, DomainError> {
    hash(password, cost).map_err(|e| DomainError::PasswordHash(e.to_string()))
}

/// Verifies a password against a bcrypt hash
///
/// # Returns
/// * `Ok(bool)` - True if password matches, false otherwise
/// * `Err(DomainError::PasswordHash)` - If the stored hash is malformed
///
/// # Example
/// ```
/// use token_api::auth::password::{hash_password, verify_password};
///
/// let hash = hash_password("my_password", 4).unwrap();
/// let valid = verify_password("my_password", &hash).unwrap();
/// assert!(valid);
/// ```
pub fn verify_password(password: &str, hash: &str) -> Result<bool, DomainError> {
    verify(password, hash).map_err(|e| DomainError::PasswordHash(e.to_string()))
}
