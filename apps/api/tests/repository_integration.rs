//! Integration tests for repository layer
//!
//! The same contract checks run against the in-memory adapters and, when
//! `DATABASE_URL` is set, against PostgreSQL.

use chrono::Utc;
use sqlx::PgPool;
use std::sync::Arc;
use token_api::domain::repositories::{RepositoryError, TokenRepository, UserRepository};
use token_api::domain::token::{Token, TokenAttributes};
use token_api::domain::user::{Email, User, UserStatus};
use token_api::infrastructure::repositories::{
    InMemoryTokenRepository, InMemoryUserRepository, PostgresTokenRepository,
    PostgresUserRepository,
};
use uuid::Uuid;

const TEST_COST: u32 = 4;

/// Set up a migrated PostgreSQL pool, or `None` when no database is configured
async fn setup_test_db() -> Option<PgPool> {
    let database_url = std::env::var("DATABASE_URL").ok()?;

    let pool = PgPool::connect(&database_url)
        .await
        .expect("Failed to connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

/// A user with unique username/email so runs do not collide
fn test_user(rate_limit: i64) -> User {
    let tag = Uuid::new_v4().simple().to_string();
    let mut user = User::new(
        format!("user-{tag}"),
        Email::new(format!("{tag}@example.com")).unwrap(),
        rate_limit,
    )
    .unwrap();
    user.set_password("testpassword", TEST_COST).unwrap();
    user
}

async fn check_user_lookups(repo: &dyn UserRepository) {
    let user = test_user(10);
    repo.create(&user).await.expect("Failed to create user");

    let found = repo
        .find_identity(user.id)
        .await
        .unwrap()
        .expect("active user found by id");
    assert_eq!(found.username, user.username);
    assert_eq!(found.email, user.email);
    assert!(found.validate_password("testpassword"));

    let by_name = repo.find_by_username(&user.username).await.unwrap();
    assert_eq!(by_name.map(|u| u.id), Some(user.id));

    let by_email = repo.find_by_email(&user.email).await.unwrap();
    assert_eq!(by_email.map(|u| u.id), Some(user.id));

    let by_key = repo
        .find_identity_by_access_token(&user.auth_key)
        .await
        .unwrap();
    assert_eq!(by_key.map(|u| u.id), Some(user.id));

    assert!(repo
        .find_identity_by_access_token("missing-key")
        .await
        .unwrap()
        .is_none());
}

async fn check_deleted_users_are_hidden(repo: &dyn UserRepository) {
    let mut user = test_user(10);
    repo.create(&user).await.unwrap();

    user.status = UserStatus::Deleted;
    user.touch();
    repo.update(&user).await.expect("Failed to update user");

    assert!(repo.find_identity(user.id).await.unwrap().is_none());
    assert!(repo.find_by_username(&user.username).await.unwrap().is_none());
    assert!(repo
        .find_identity_by_access_token(&user.auth_key)
        .await
        .unwrap()
        .is_none());

    // Raw lookups still see the record
    let raw = repo.find_by_id(user.id).await.unwrap().expect("record kept");
    assert_eq!(raw.status, UserStatus::Deleted);
    assert!(repo.find_by_auth_key(&user.auth_key).await.unwrap().is_some());
}

async fn check_duplicate_username(repo: &dyn UserRepository) {
    let user = test_user(10);
    repo.create(&user).await.unwrap();

    let mut clash = test_user(10);
    clash.username = user.username.clone();

    let err = repo.create(&clash).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Duplicate(_)), "got {err:?}");
}

async fn check_password_reset_lookup(repo: &dyn UserRepository) {
    let now = Utc::now().timestamp();
    let mut user = test_user(10);
    user.generate_password_reset_token(now);
    repo.create(&user).await.unwrap();
    let token = user.password_reset_token.clone().unwrap();

    let found = repo
        .find_by_password_reset_token(&token, 3600, now)
        .await
        .unwrap();
    assert_eq!(found.map(|u| u.id), Some(user.id));

    // Expired
    assert!(repo
        .find_by_password_reset_token(&token, 3600, now + 3601)
        .await
        .unwrap()
        .is_none());

    assert!(repo
        .find_by_password_reset_token("", 3600, now)
        .await
        .unwrap()
        .is_none());
}

async fn check_allowance_consumption(repo: &dyn UserRepository) {
    let user = test_user(2);
    repo.create(&user).await.unwrap();
    let now = user.allowance_updated_at;

    let first = repo.consume_allowance(user.id, now).await.unwrap();
    assert!(first.allowed);
    assert_eq!(first.remaining, 1);

    let second = repo.consume_allowance(user.id, now).await.unwrap();
    assert!(second.allowed);
    assert_eq!(second.remaining, 0);

    let third = repo.consume_allowance(user.id, now).await.unwrap();
    assert!(!third.allowed);

    // One second later the bucket has refilled
    let later = repo.consume_allowance(user.id, now + 1).await.unwrap();
    assert!(later.allowed);
    assert_eq!(later.remaining, 1);

    let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.allowance, 1);
    assert_eq!(stored.allowance_updated_at, now + 1);

    let missing = repo.consume_allowance(Uuid::new_v4(), now).await;
    assert!(matches!(missing, Err(RepositoryError::NotFound { .. })));
}

async fn check_update_keeps_consumed_allowance(repo: &dyn UserRepository) {
    let user = test_user(100);
    repo.create(&user).await.unwrap();
    let now = user.allowance_updated_at;

    // A snapshot taken before requests are charged
    let mut stale = repo.find_by_id(user.id).await.unwrap().unwrap();

    for _ in 0..50 {
        repo.consume_allowance(user.id, now).await.unwrap();
    }

    stale.address = Some("1 Main St".to_string());
    stale.touch();
    repo.update(&stale).await.unwrap();

    let stored = repo.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.address.as_deref(), Some("1 Main St"));
    assert_eq!(stored.allowance, 50);
    assert_eq!(stored.allowance_updated_at, now);
}

async fn check_token_crud(users: &dyn UserRepository, tokens: &dyn TokenRepository) {
    let author = test_user(10);
    users.create(&author).await.unwrap();

    let mut token = Token::new(
        author.id,
        TokenAttributes {
            token_type: Some("api".to_string()),
            value: Some("value-1".to_string()),
            secret: Some("secret-1".to_string()),
        },
    );
    tokens.create(&token).await.expect("Failed to create token");

    let found = tokens.find_by_id(token.id).await.unwrap().expect("token found");
    assert_eq!(found.author_id, author.id);
    assert_eq!(found.secret.as_deref(), Some("secret-1"));

    token.apply(TokenAttributes {
        value: Some("value-2".to_string()),
        ..Default::default()
    });
    tokens.update(&token).await.expect("Failed to update token");

    let found = tokens.find_by_id(token.id).await.unwrap().unwrap();
    assert_eq!(found.value.as_deref(), Some("value-2"));
    assert_eq!(found.token_type.as_deref(), Some("api"));

    tokens.delete(token.id).await.expect("Failed to delete token");
    assert!(tokens.find_by_id(token.id).await.unwrap().is_none());

    let err = tokens.delete(token.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));

    let err = tokens.update(&token).await.unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound { .. }));
}

#[tokio::test]
async fn test_in_memory_user_repository_contract() {
    let repo = InMemoryUserRepository::new();

    check_user_lookups(&repo).await;
    check_deleted_users_are_hidden(&repo).await;
    check_duplicate_username(&repo).await;
    check_password_reset_lookup(&repo).await;
    check_allowance_consumption(&repo).await;
    check_update_keeps_consumed_allowance(&repo).await;
}

#[tokio::test]
async fn test_in_memory_token_repository_contract() {
    let users = InMemoryUserRepository::new();
    let tokens = InMemoryTokenRepository::new();

    check_token_crud(&users, &tokens).await;
}

#[tokio::test]
async fn test_in_memory_token_pagination() {
    let tokens = InMemoryTokenRepository::new();
    let author = Uuid::new_v4();

    let mut ids = Vec::new();
    for _ in 0..5 {
        let token = Token::new(author, TokenAttributes::default());
        ids.push(token.id);
        tokens.create(&token).await.unwrap();
    }

    assert_eq!(tokens.count().await.unwrap(), 5);

    let first = tokens.list(0, 2).await.unwrap();
    let second = tokens.list(2, 2).await.unwrap();
    let third = tokens.list(4, 2).await.unwrap();
    assert_eq!((first.len(), second.len(), third.len()), (2, 2, 1));

    let mut listed: Vec<Uuid> = first
        .iter()
        .chain(&second)
        .chain(&third)
        .map(|t| t.id)
        .collect();
    listed.sort();
    ids.sort();
    assert_eq!(listed, ids);

    assert!(tokens.list(10, 2).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_in_memory_allowance_is_serialized_per_user() {
    let repo = Arc::new(InMemoryUserRepository::new());
    let user = test_user(5);
    repo.create(&user).await.unwrap();
    let (user_id, now) = (user.id, user.allowance_updated_at);

    let handles: Vec<_> = (0..20)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.consume_allowance(user_id, now).await.unwrap() })
        })
        .collect();

    let mut allowed = 0;
    for handle in handles {
        if handle.await.unwrap().allowed {
            allowed += 1;
        }
    }

    // No lost updates: exactly the bucket size gets through
    assert_eq!(allowed, 5);
}

#[tokio::test]
async fn test_postgres_repository_contract() {
    let Some(pool) = setup_test_db().await else {
        eprintln!("DATABASE_URL not set; skipping PostgreSQL repository tests");
        return;
    };

    let users = PostgresUserRepository::new(pool.clone());
    let tokens = PostgresTokenRepository::new(pool);

    check_user_lookups(&users).await;
    check_deleted_users_are_hidden(&users).await;
    check_duplicate_username(&users).await;
    check_password_reset_lookup(&users).await;
    check_allowance_consumption(&users).await;
    check_update_keeps_consumed_allowance(&users).await;
    check_token_crud(&users, &tokens).await;
}
