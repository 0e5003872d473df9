use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::repositories::RepositoryError;
use crate::domain::user::{is_password_reset_token_valid, Email, User};

/// Request body for user registration
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub address: Option<String>,
}

/// Response from successful registration
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub auth_key: String,
    pub message: String,
}

/// Request body for user login
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response from successful login; `auth_key` is the bearer token
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub auth_key: String,
    pub user_id: Uuid,
}

/// Request body for issuing a password reset token
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Request body for completing a password reset
#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirm {
    pub token: String,
    pub password: String,
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Register a new user
///
/// POST /v1/auth/register
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<RegisterResponse>), ApiError> {
    let Json(req) = payload?;
    let email = Email::new(&req.email)?;

    let mut user = User::new(req.username, email, state.config.default_rate_limit)?;
    user.address = req.address;
    user.set_password(&req.password, state.config.password_hash_cost)?;

    state.users.create(&user).await.map_err(|e| match e {
        RepositoryError::Duplicate(_) => {
            ApiError::bad_request("Username or email already registered")
        }
        other => ApiError::from(other),
    })?;

    tracing::info!(user_id = %user.id, username = %user.username, "user registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user_id: user.id,
            auth_key: user.auth_key,
            message: "User registered successfully".to_string(),
        }),
    ))
}

/// Login with username and password
///
/// POST /v1/auth/login
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(req) = payload?;
    // Deleted users are filtered out by the lookup
    let mut user = state
        .users
        .find_by_username(req.username.trim())
        .await?
        .ok_or_else(|| ApiError::unauthorized("Incorrect username or password."))?;

    if !user.validate_password(&req.password) {
        return Err(ApiError::unauthorized("Incorrect username or password."));
    }

    if user.auth_key.is_empty() {
        user.generate_auth_key();
        user.touch();
        state.users.update(&user).await?;
    }

    Ok(Json(LoginResponse {
        auth_key: user.auth_key,
        user_id: user.id,
    }))
}

/// Issue a password reset token for the account with this email
///
/// Responds identically whether or not the account exists. An unexpired
/// token is reused.
///
/// POST /v1/auth/password-reset
pub async fn request_password_reset(
    State(state): State<AppState>,
    payload: Result<Json<PasswordResetRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let email = Email::new(&req.email)?;
    let now = Utc::now().timestamp();

    if let Some(mut user) = state.users.find_by_email(&email).await? {
        let current = user.password_reset_token.as_deref().unwrap_or_default();
        if !is_password_reset_token_valid(current, state.config.password_reset_token_expire, now) {
            user.generate_password_reset_token(now);
            user.touch();
            state.users.update(&user).await?;
        }

        // Delivery is out of band
        tracing::debug!(
            user_id = %user.id,
            token = user.password_reset_token.as_deref().unwrap_or_default(),
            "password reset token issued"
        );
    }

    Ok(MessageResponse::new(
        "Check your email for further instructions.",
    ))
}

/// Set a new password using a reset token
///
/// POST /v1/auth/password-reset/confirm
pub async fn confirm_password_reset(
    State(state): State<AppState>,
    payload: Result<Json<PasswordResetConfirm>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let token = req.token.trim();
    if token.is_empty() {
        return Err(ApiError::bad_request("Password reset token cannot be blank."));
    }

    let mut user = state
        .users
        .find_by_password_reset_token(
            token,
            state.config.password_reset_token_expire,
            Utc::now().timestamp(),
        )
        .await?
        .ok_or_else(|| ApiError::bad_request("Wrong password reset token."))?;

    user.set_password(&req.password, state.config.password_hash_cost)?;
    user.remove_password_reset_token();
    user.touch();
    state.users.update(&user).await?;

    tracing::info!(user_id = %user.id, "password reset");

    Ok(MessageResponse::new("New password saved."))
}

/// Health check endpoint
///
/// GET /health
pub async fn health_check() -> &'static str {
    "OK"
}
