// Repository contracts (ports)
// Implemented by infrastructure adapters

pub mod token_repository;
pub mod user_repository;

pub use token_repository::TokenRepository;
pub use user_repository::UserRepository;

use thiserror::Error;

/// Persistence failures surfaced by repository implementations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Duplicate {0}")]
    Duplicate(String),

    #[error("Corrupt {entity} record: {reason}")]
    Corrupt { entity: &'static str, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
