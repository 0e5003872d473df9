// In-memory repository adapters
// Back the test suite and database-less development runs

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::rate_limit::{consume, RateLimitDecision};
use crate::domain::repositories::{RepositoryError, TokenRepository, UserRepository};
use crate::domain::token::Token;
use crate::domain::user::{Email, User};

/// UserRepository backed by a HashMap
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(id: Uuid) -> RepositoryError {
        RepositoryError::NotFound {
            entity: "user",
            id: id.to_string(),
        }
    }

    /// Name of the unique column `user` would clash on, ignoring `user` itself
    fn clash(users: &HashMap<Uuid, User>, user: &User) -> Option<&'static str> {
        users.values().filter(|other| other.id != user.id).find_map(|other| {
            if other.username == user.username {
                Some("username")
            } else if other.email == user.email {
                Some("email")
            } else if other.auth_key == user.auth_key {
                Some("auth_key")
            } else if other.password_reset_token.is_some()
                && other.password_reset_token == user.password_reset_token
            {
                Some("password_reset_token")
            } else {
                None
            }
        })
    }

    async fn find_active(&self, predicate: impl Fn(&User) -> bool + Send) -> Option<User> {
        self.users
            .read()
            .await
            .values()
            .find(|user| user.is_active() && predicate(user))
            .cloned()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) {
            return Err(RepositoryError::Duplicate("id".to_string()));
        }
        if let Some(column) = Self::clash(&users, user) {
            return Err(RepositoryError::Duplicate(column.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), RepositoryError> {
        let mut users = self.users.write().await;
        if let Some(column) = Self::clash(&users, user) {
            return Err(RepositoryError::Duplicate(column.to_string()));
        }
        let stored = users.get_mut(&user.id).ok_or_else(|| Self::not_found(user.id))?;

        let (allowance, allowance_updated_at) = (stored.allowance, stored.allowance_updated_at);
        *stored = User {
            allowance,
            allowance_updated_at,
            ..user.clone()
        };
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_auth_key(&self, auth_key: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.auth_key == auth_key)
            .cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        Ok(self.find_active(|user| user.username == username).await)
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        Ok(self.find_active(|user| &user.email == email).await)
    }

    async fn find_active_by_password_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, RepositoryError> {
        Ok(self
            .find_active(|user| user.password_reset_token.as_deref() == Some(token))
            .await)
    }

    async fn consume_allowance(
        &self,
        user_id: Uuid,
        now: i64,
    ) -> Result<RateLimitDecision, RepositoryError> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&user_id)
            .ok_or_else(|| Self::not_found(user_id))?;

        let decision = consume(user.get_rate_limit(), user.load_allowance(), now);
        user.save_allowance(decision.allowance);
        Ok(decision)
    }
}

/// TokenRepository backed by a HashMap
#[derive(Default)]
pub struct InMemoryTokenRepository {
    tokens: RwLock<HashMap<Uuid, Token>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn not_found(id: Uuid) -> RepositoryError {
        RepositoryError::NotFound {
            entity: "token",
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn create(&self, token: &Token) -> Result<(), RepositoryError> {
        let mut tokens = self.tokens.write().await;
        if tokens.contains_key(&token.id) {
            return Err(RepositoryError::Duplicate("id".to_string()));
        }
        tokens.insert(token.id, token.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Token>, RepositoryError> {
        Ok(self.tokens.read().await.get(&id).cloned())
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Token>, RepositoryError> {
        let tokens = self.tokens.read().await;
        let mut page: Vec<Token> = tokens.values().cloned().collect();
        page.sort_by_key(|token| (token.created_at, token.id));

        Ok(page
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        Ok(self.tokens.read().await.len() as i64)
    }

    async fn update(&self, token: &Token) -> Result<(), RepositoryError> {
        let mut tokens = self.tokens.write().await;
        match tokens.get_mut(&token.id) {
            Some(existing) => {
                *existing = token.clone();
                Ok(())
            }
            None => Err(Self::not_found(token.id)),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        self.tokens
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| Self::not_found(id))
    }
}
