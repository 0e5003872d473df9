// Repository implementations (data access layer)
// Adapters that implement domain repository interfaces

pub mod in_memory;
pub mod postgres_token_repository;
pub mod postgres_user_repository;

pub use in_memory::{InMemoryTokenRepository, InMemoryUserRepository};
pub use postgres_token_repository::PostgresTokenRepository;
pub use postgres_user_repository::PostgresUserRepository;
