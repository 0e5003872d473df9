use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::value_objects::{Email, UserStatus};
use crate::auth::password::{hash_password, verify_password};
use crate::auth::random::{generate_random_string, DEFAULT_LENGTH};
use crate::domain::errors::DomainError;
use crate::domain::rate_limit::{Allowance, RateLimit};

/// Minimum accepted length for new passwords
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// User account: identity, credentials, and rate-limit counters
///
/// Authentication is by `auth_key`, presented as a bearer token. The
/// allowance pair (`allowance`, `allowance_updated_at`) is the persisted
/// state of the per-user token bucket.
///
/// # Example
/// ```
/// use token_api::domain::user::{Email, User};
///
/// let user = User::new("alice", Email::new("alice@example.com").unwrap(), 100)
///     .expect("valid user");
/// assert!(user.is_active());
/// assert_eq!(user.auth_key.len(), 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: Email,
    pub address: Option<String>,
    pub status: UserStatus,
    pub access_token: Option<String>,
    pub auth_key: String,
    pub password_hash: String,
    pub password_reset_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Requests per second
    pub rate_limit: i64,
    pub allowance: i64,
    /// Unix timestamp (seconds)
    pub allowance_updated_at: i64,
}

impl User {
    /// Creates an active user with a fresh auth key and a full allowance
    ///
    /// The password hash starts empty; call [`User::set_password`] before
    /// persisting.
    pub fn new(
        username: impl Into<String>,
        email: Email,
        rate_limit: i64,
    ) -> Result<Self, DomainError> {
        let username = username.into().trim().to_string();
        if username.is_empty() {
            return Err(DomainError::BlankUsername);
        }

        let now = Utc::now();
        Ok(Self {
            id: Uuid::new_v4(),
            username,
            email,
            address: None,
            status: UserStatus::default(),
            access_token: None,
            auth_key: generate_random_string(DEFAULT_LENGTH),
            password_hash: String::new(),
            password_reset_token: None,
            created_at: now,
            updated_at: now,
            rate_limit,
            allowance: rate_limit,
            allowance_updated_at: now.timestamp(),
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// Compares a presented key with the stored auth key
    pub fn validate_auth_key(&self, auth_key: &str) -> bool {
        self.auth_key == auth_key
    }

    /// Replaces the auth key with a new random one
    pub fn generate_auth_key(&mut self) {
        self.auth_key = generate_random_string(DEFAULT_LENGTH);
    }

    /// Hashes and stores a new password
    ///
    /// # Errors
    /// * `DomainError::PasswordTooShort` - fewer than [`MIN_PASSWORD_LENGTH`] characters
    /// * `DomainError::PasswordHash` - bcrypt failure (e.g. cost out of range)
    pub fn set_password(&mut self, password: &str, cost: u32) -> Result<(), DomainError> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(DomainError::PasswordTooShort(MIN_PASSWORD_LENGTH));
        }
        self.password_hash = hash_password(password, cost)?;
        Ok(())
    }

    /// Checks a password against the stored hash
    ///
    /// A missing or malformed hash never validates.
    pub fn validate_password(&self, password: &str) -> bool {
        if self.password_hash.is_empty() {
            return false;
        }
        verify_password(password, &self.password_hash).unwrap_or_else(|e| {
            tracing::warn!(user_id = %self.id, error = %e, "stored password hash is unusable");
            false
        })
    }

    /// Issues a reset token of the form `<random>_<unix timestamp>`
    pub fn generate_password_reset_token(&mut self, now: i64) {
        self.password_reset_token = Some(format!(
            "{}_{}",
            generate_random_string(DEFAULT_LENGTH),
            now
        ));
    }

    pub fn remove_password_reset_token(&mut self) {
        self.password_reset_token = None;
    }

    /// Requests allowed per window for this user
    pub fn get_rate_limit(&self) -> RateLimit {
        RateLimit::per_second(self.rate_limit)
    }

    /// Current persisted allowance
    pub fn load_allowance(&self) -> Allowance {
        Allowance {
            remaining: self.allowance,
            updated_at: self.allowance_updated_at,
        }
    }

    /// Records a new allowance; persisting it is the repository's job
    pub fn save_allowance(&mut self, allowance: Allowance) {
        self.allowance = allowance.remaining;
        self.allowance_updated_at = allowance.updated_at;
        self.touch();
    }

    /// Bumps `updated_at`
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Checks whether a password reset token is still within its lifetime
///
/// The token's suffix after the last `_` is its issue timestamp. An empty
/// token is never valid; a suffix that is not a number counts as issued at
/// the epoch.
///
/// # Example
/// ```
/// use token_api::domain::user::is_password_reset_token_valid;
///
/// assert!(is_password_reset_token_valid("abc_1000", 3600, 2000));
/// assert!(!is_password_reset_token_valid("abc_1000", 3600, 5000));
/// assert!(!is_password_reset_token_valid("", 3600, 0));
/// ```
pub fn is_password_reset_token_valid(token: &str, expire: i64, now: i64) -> bool {
    if token.is_empty() {
        return false;
    }

    let suffix = token.rsplit_once('_').map_or(token, |(_, suffix)| suffix);
    let issued_at = suffix.parse::<i64>().unwrap_or(0);
    issued_at.saturating_add(expire) >= now
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_COST: u32 = 4;

    fn user() -> User {
        User::new("alice", Email::new("alice@example.com").unwrap(), 10).expect("valid user")
    }

    #[test]
    fn new_user_defaults() {
        let user = user();

        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.allowance, 10);
        assert_eq!(user.allowance_updated_at, user.created_at.timestamp());
        assert!(user.password_reset_token.is_none());
        assert!(user.password_hash.is_empty());
    }

    #[test]
    fn blank_username_is_rejected() {
        let err = User::new("   ", Email::new("a@b.c").unwrap(), 1).unwrap_err();
        assert_eq!(err, DomainError::BlankUsername);
    }

    #[test]
    fn auth_key_validation() {
        let mut user = user();
        let original = user.auth_key.clone();

        assert!(user.validate_auth_key(&original));
        assert!(!user.validate_auth_key("something-else"));

        user.generate_auth_key();
        assert_ne!(user.auth_key, original);
        assert!(!user.validate_auth_key(&original));
    }

    #[test]
    fn password_round_trip() {
        let mut user = user();
        assert!(!user.validate_password("correct horse"));

        user.set_password("correct horse", TEST_COST).expect("hash");
        assert!(user.validate_password("correct horse"));
        assert!(!user.validate_password("wrong horse"));
    }

    #[test]
    fn short_password_is_rejected() {
        let mut user = user();
        assert_eq!(
            user.set_password("short", TEST_COST),
            Err(DomainError::PasswordTooShort(MIN_PASSWORD_LENGTH))
        );
    }

    #[test]
    fn corrupt_hash_never_validates() {
        let mut user = user();
        user.password_hash = "garbage".to_string();
        assert!(!user.validate_password("anything"));
    }

    #[test]
    fn reset_token_carries_timestamp() {
        let mut user = user();
        user.generate_password_reset_token(1_700_000_000);

        let token = user.password_reset_token.clone().expect("token issued");
        assert!(token.ends_with("_1700000000"));
        assert!(is_password_reset_token_valid(&token, 3600, 1_700_000_000 + 3600));
        assert!(!is_password_reset_token_valid(&token, 3600, 1_700_000_000 + 3601));

        user.remove_password_reset_token();
        assert!(user.password_reset_token.is_none());
    }

    #[test]
    fn reset_token_with_underscores_in_prefix() {
        assert!(is_password_reset_token_valid("a_b_c_500", 100, 600));
        assert!(!is_password_reset_token_valid("a_b_c_500", 100, 601));
    }

    #[test]
    fn malformed_reset_token_is_expired() {
        assert!(!is_password_reset_token_valid("no-timestamp", 3600, 1_000_000));
        assert!(!is_password_reset_token_valid("abc_xyz", 3600, 1_000_000));
    }

    #[test]
    fn allowance_bookkeeping() {
        let mut user = user();
        assert_eq!(user.get_rate_limit(), RateLimit::per_second(10));

        user.save_allowance(Allowance {
            remaining: 3,
            updated_at: 42,
        });
        assert_eq!(
            user.load_allowance(),
            Allowance {
                remaining: 3,
                updated_at: 42
            }
        );
    }
}
