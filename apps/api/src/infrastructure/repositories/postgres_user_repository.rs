use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::domain::rate_limit::{consume, Allowance, RateLimit, RateLimitDecision};
use crate::domain::repositories::{RepositoryError, UserRepository};
use crate::domain::user::{Email, User, UserStatus};

const USER_COLUMNS: &str = r#"
    id, username, email, address, status, access_token, auth_key,
    password_hash, password_reset_token, created_at, updated_at,
    rate_limit, allowance, allowance_updated_at
"#;

/// Raw `users` row
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    address: Option<String>,
    status: i16,
    access_token: Option<String>,
    auth_key: String,
    password_hash: String,
    password_reset_token: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    rate_limit: i64,
    allowance: i64,
    allowance_updated_at: i64,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let corrupt = |e: crate::domain::errors::DomainError| RepositoryError::Corrupt {
            entity: "user",
            reason: e.to_string(),
        };

        Ok(User {
            id: row.id,
            username: row.username,
            email: Email::new(row.email).map_err(corrupt)?,
            address: row.address,
            status: UserStatus::from_code(row.status).map_err(corrupt)?,
            access_token: row.access_token,
            auth_key: row.auth_key,
            password_hash: row.password_hash,
            password_reset_token: row.password_reset_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
            rate_limit: row.rate_limit,
            allowance: row.allowance,
            allowance_updated_at: row.allowance_updated_at,
        })
    }
}

/// Maps unique-constraint violations to `Duplicate`
pub(crate) fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return RepositoryError::Duplicate(
                db.constraint()
                    .map(str::to_string)
                    .unwrap_or_else(|| "record".to_string()),
            );
        }
    }
    RepositoryError::Database(e)
}

/// PostgreSQL implementation of UserRepository
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a new PostgresUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        predicate: &str,
        value: &str,
    ) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(value)
            .bind(UserStatus::Active.code())
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn create(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (
                id, username, email, address, status, access_token, auth_key,
                password_hash, password_reset_token, created_at, updated_at,
                rate_limit, allowance, allowance_updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(user.email.as_str())
        .bind(&user.address)
        .bind(user.status.code())
        .bind(&user.access_token)
        .bind(&user.auth_key)
        .bind(&user.password_hash)
        .bind(&user.password_reset_token)
        .bind(user.created_at)
        .bind(user.updated_at)
        .bind(user.rate_limit)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    async fn update(&self, user: &User) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                username = $2, email = $3, address = $4, status = $5,
                access_token = $6, auth_key = $7, password_hash = $8,
                password_reset_token = $9, updated_at = $10, rate_limit = $11
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(user.email.as_str())
        .bind(&user.address)
        .bind(user.status.code())
        .bind(&user.access_token)
        .bind(&user.auth_key)
        .bind(&user.password_hash)
        .bind(&user.password_reset_token)
        .bind(user.updated_at)
        .bind(user.rate_limit)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound {
                entity: "user",
                id: user.id.to_string(),
            });
        }

        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_auth_key(&self, auth_key: &str) -> Result<Option<User>, RepositoryError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE auth_key = $1");
        let row = sqlx::query_as::<_, UserRow>(&sql)
            .bind(auth_key)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepositoryError> {
        self.fetch_one_where("username = $1 AND status = $2", username)
            .await
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        self.fetch_one_where("email = $1 AND status = $2", email.as_str())
            .await
    }

    async fn find_active_by_password_reset_token(
        &self,
        token: &str,
    ) -> Result<Option<User>, RepositoryError> {
        self.fetch_one_where("password_reset_token = $1 AND status = $2", token)
            .await
    }

    async fn consume_allowance(
        &self,
        user_id: Uuid,
        now: i64,
    ) -> Result<RateLimitDecision, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(i64, i64, i64)> = sqlx::query_as(
            r#"
            SELECT rate_limit, allowance, allowance_updated_at
            FROM users
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let (rate_limit, remaining, updated_at) = row.ok_or_else(|| RepositoryError::NotFound {
            entity: "user",
            id: user_id.to_string(),
        })?;

        let decision = consume(
            RateLimit::per_second(rate_limit),
            Allowance {
                remaining,
                updated_at,
            },
            now,
        );

        sqlx::query(
            r#"
            UPDATE users
            SET allowance = $2, allowance_updated_at = $3, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .bind(decision.allowance.remaining)
        .bind(decision.allowance.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(decision)
    }
}
