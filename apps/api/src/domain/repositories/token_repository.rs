use async_trait::async_trait;
use uuid::Uuid;

use super::RepositoryError;
use crate::domain::token::Token;

/// Repository trait for Token records
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Insert a new token
    async fn create(&self, token: &Token) -> Result<(), RepositoryError>;

    /// Find a token by ID
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Token>, RepositoryError>;

    /// One page of tokens, oldest first
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Token>, RepositoryError>;

    /// Total number of tokens
    async fn count(&self) -> Result<i64, RepositoryError>;

    /// Overwrite an existing token; `NotFound` if it is gone
    async fn update(&self, token: &Token) -> Result<(), RepositoryError>;

    /// Delete a token by ID; `NotFound` if it is gone
    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError>;
}
