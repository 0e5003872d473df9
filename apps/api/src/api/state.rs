use sqlx::PgPool;
use std::sync::Arc;

use crate::config::Config;
use crate::domain::repositories::{TokenRepository, UserRepository};
use crate::infrastructure::repositories::{
    InMemoryTokenRepository, InMemoryUserRepository, PostgresTokenRepository,
    PostgresUserRepository,
};

/// Shared handler state: repositories and configuration
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub tokens: Arc<dyn TokenRepository>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tokens: Arc<dyn TokenRepository>,
        config: Config,
    ) -> Self {
        Self {
            users,
            tokens,
            config: Arc::new(config),
        }
    }

    /// State backed by PostgreSQL repositories sharing one pool
    pub fn postgres(pool: PgPool, config: Config) -> Self {
        Self::new(
            Arc::new(PostgresUserRepository::new(pool.clone())),
            Arc::new(PostgresTokenRepository::new(pool)),
            config,
        )
    }

    /// State backed by process-local repositories
    pub fn in_memory(config: Config) -> Self {
        Self::new(
            Arc::new(InMemoryUserRepository::new()),
            Arc::new(InMemoryTokenRepository::new()),
            config,
        )
    }
}
