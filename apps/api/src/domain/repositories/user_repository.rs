use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::rate_limit::RateLimitDecision;
use crate::domain::user::{is_password_reset_token_valid, Email, User};

/// Repository trait for User records
///
/// Lookups named after identities (`find_identity*`, `find_by_username`,
/// `find_by_email`, reset-token lookups) only return active users.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user; `Duplicate` on username, email or auth key clash
    async fn create(&self, user: &User) -> Result<(), RepositoryError>;

    /// Overwrite an existing user
    ///
    /// The stored allowance is left alone; only [`consume_allowance`]
    /// writes it.
    ///
    /// [`consume_allowance`]: UserRepository::consume_allowance
    async fn update(&self, user: &User) -> Result<(), RepositoryError>;

    /// Find a user by ID regardless of status
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError>;

    /// Find a user by auth key regardless of status
    async fn find_by_auth_key(&self, auth_key: &str) -> Result<Option<User>, RepositoryError>;

    /// Find an active user by username
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError>;

    /// Find an active user by email address
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Find the active user holding a reset token, without checking expiry
    async fn find_active_by_password_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, RepositoryError>;

    /// Charge one request against the user's allowance at `now`
    ///
    /// Load, compute, and save happen atomically per user.
    async fn consume_allowance(
        &self,
        user_id: Uuid,
        now: i64,
    ) -> Result<RateLimitDecision, RepositoryError>;

    /// Find an active user by ID
    async fn find_identity(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.find_by_id(id).await?.filter(User::is_active))
    }

    /// Resolve a bearer token to an active user
    async fn find_identity_by_access_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self.find_by_auth_key(token).await?.filter(User::is_active))
    }

    /// Find the active user holding a reset token that has not expired
    async fn find_by_password_reset_token(
        &self,
        token: &str,
        expire: i64,
        now: i64,
    ) -> Result<Option<User>, RepositoryError> {
        if !is_password_reset_token_valid(token, expire, now) {
            return Ok(None);
        }
        self.find_active_by_password_reset_token(token).await
    }
}
