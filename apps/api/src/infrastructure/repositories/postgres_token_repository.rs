use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::postgres_user_repository::map_write_error;
use crate::domain::repositories::{RepositoryError, TokenRepository};
use crate::domain::token::Token;

/// Raw `tokens` row
#[derive(Debug, FromRow)]
struct TokenRow {
    id: Uuid,
    author_id: Uuid,
    #[sqlx(rename = "type")]
    token_type: Option<String>,
    value: Option<String>,
    secret: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TokenRow> for Token {
    fn from(row: TokenRow) -> Self {
        Token {
            id: row.id,
            author_id: row.author_id,
            token_type: row.token_type,
            value: row.value,
            secret: row.secret,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// PostgreSQL implementation of TokenRepository
pub struct PostgresTokenRepository {
    pool: PgPool,
}

impl PostgresTokenRepository {
    /// Creates a new PostgresTokenRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn not_found(id: Uuid) -> RepositoryError {
        RepositoryError::NotFound {
            entity: "token",
            id: id.to_string(),
        }
    }
}

#[async_trait]
impl TokenRepository for PostgresTokenRepository {
    async fn create(&self, token: &Token) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO tokens (id, author_id, type, value, secret, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(token.id)
        .bind(token.author_id)
        .bind(&token.token_type)
        .bind(&token.value)
        .bind(&token.secret)
        .bind(token.created_at)
        .bind(token.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Token>, RepositoryError> {
        let row = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT id, author_id, type, value, secret, created_at, updated_at
            FROM tokens
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Token::from))
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<Token>, RepositoryError> {
        let rows = sqlx::query_as::<_, TokenRow>(
            r#"
            SELECT id, author_id, type, value, secret, created_at, updated_at
            FROM tokens
            ORDER BY created_at, id
            OFFSET $1
            LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Token::from).collect())
    }

    async fn count(&self) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM tokens")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn update(&self, token: &Token) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE tokens
            SET type = $2, value = $3, secret = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(token.id)
        .bind(&token.token_type)
        .bind(&token.value)
        .bind(&token.secret)
        .bind(token.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(token.id));
        }

        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Self::not_found(id));
        }

        Ok(())
    }
}
