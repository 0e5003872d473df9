use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS, ALLOW, LOCATION, ORIGIN,
        },
        HeaderMap, HeaderValue, StatusCode,
    },
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::middleware::CurrentUser;
use crate::api::pagination::{PageQuery, Pagination};
use crate::api::state::AppState;
use crate::domain::token::{Token, TokenAction, TokenAttributes};
use crate::domain::user::User;

pub const COLLECTION_PATH: &str = "/v1/tokens";
pub const COLLECTION_METHODS: &str = "GET, POST, HEAD, OPTIONS";
pub const RESOURCE_METHODS: &str = "GET, PUT, PATCH, DELETE, HEAD, OPTIONS";

/// Request body for creating or updating a token
///
/// Unknown fields are ignored; non-string values are rejected.
#[derive(Debug, Default, Deserialize)]
pub struct TokenPayload {
    #[serde(rename = "type")]
    pub token_type: Option<String>,
    pub value: Option<String>,
    pub secret: Option<String>,
}

impl From<TokenPayload> for TokenAttributes {
    fn from(payload: TokenPayload) -> Self {
        Self {
            token_type: payload.token_type,
            value: payload.value,
            secret: payload.secret,
        }
    }
}

/// Public view of a token; `secret` and `author_id` are never exposed
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub token_type: Option<String>,
    pub value: Option<String>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub updated_at: DateTime<Utc>,
}

impl From<&Token> for TokenResponse {
    fn from(token: &Token) -> Self {
        Self {
            id: token.id,
            token_type: token.token_type.clone(),
            value: token.value.clone(),
            created_at: token.created_at,
            updated_at: token.updated_at,
        }
    }
}

/// Rejects actions the user may not perform on `token`
pub fn check_access(action: TokenAction, token: &Token, user: &User) -> Result<(), ApiError> {
    if action.requires_authorship() && !token.is_authored_by(user.id) {
        tracing::info!(
            user_id = %user.id,
            token_id = %token.id,
            action = %action,
            "denied token access"
        );
        return Err(ApiError::forbidden(format!(
            "You can only {action} tokens that you've created."
        )));
    }
    Ok(())
}

async fn find_token(state: &AppState, id: &str) -> Result<Token, ApiError> {
    let not_found = || ApiError::not_found(format!("Object not found: {id}"));
    let id = Uuid::parse_str(id).map_err(|_| not_found())?;

    state.tokens.find_by_id(id).await?.ok_or_else(not_found)
}

/// List tokens, one page at a time
///
/// GET /v1/tokens
pub async fn list_tokens(
    State(state): State<AppState>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> Result<(HeaderMap, Json<Vec<TokenResponse>>), ApiError> {
    let Query(query) = query?;
    let total = state.tokens.count().await?;
    let pagination = Pagination::resolve(
        &query,
        total.max(0) as u64,
        state.config.default_page_size,
        state.config.max_page_size,
    );

    let tokens = state
        .tokens
        .list(pagination.offset(), pagination.limit())
        .await?;

    Ok((
        pagination.headers(COLLECTION_PATH),
        Json(tokens.iter().map(TokenResponse::from).collect()),
    ))
}

/// Create a token owned by the caller
///
/// POST /v1/tokens
pub async fn create_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    payload: Result<Json<TokenPayload>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<TokenResponse>), ApiError> {
    let Json(payload) = payload?;
    let token = Token::new(user.id, payload.into());

    state.tokens.create(&token).await?;
    tracing::info!(token_id = %token.id, user_id = %user.id, "token created");

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("{COLLECTION_PATH}/{}", token.id)) {
        headers.insert(LOCATION, location);
    }

    Ok((StatusCode::CREATED, headers, Json(TokenResponse::from(&token))))
}

/// Get a token by ID
///
/// GET /v1/tokens/:id
pub async fn get_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<TokenResponse>, ApiError> {
    let token = find_token(&state, &id).await?;
    check_access(TokenAction::View, &token, &user)?;

    Ok(Json(TokenResponse::from(&token)))
}

/// Update a token; only its author may do so
///
/// PUT/PATCH /v1/tokens/:id
pub async fn update_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<TokenPayload>, JsonRejection>,
) -> Result<Json<TokenResponse>, ApiError> {
    let mut token = find_token(&state, &id).await?;
    check_access(TokenAction::Update, &token, &user)?;

    let Json(payload) = payload?;
    token.apply(payload.into());
    state.tokens.update(&token).await?;

    Ok(Json(TokenResponse::from(&token)))
}

/// Delete a token; only its author may do so
///
/// DELETE /v1/tokens/:id
pub async fn delete_token(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let token = find_token(&state, &id).await?;
    check_access(TokenAction::Delete, &token, &user)?;

    state.tokens.delete(token.id).await?;
    tracing::info!(token_id = %token.id, user_id = %user.id, "token deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// `Allow` response for an options request, doubling as a CORS preflight
/// answer when the request carries an `Origin`
pub fn options_headers(methods: &'static str, request: &HeaderMap) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ALLOW, HeaderValue::from_static(methods));
    headers.insert(ACCESS_CONTROL_ALLOW_METHODS, HeaderValue::from_static(methods));

    if request.contains_key(ORIGIN) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        let allowed = request
            .get(ACCESS_CONTROL_REQUEST_HEADERS)
            .cloned()
            .unwrap_or_else(|| HeaderValue::from_static("*"));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, allowed);
    }
    headers
}

/// Supported methods on the collection
///
/// OPTIONS /v1/tokens
pub async fn collection_options(headers: HeaderMap) -> (StatusCode, HeaderMap) {
    (StatusCode::OK, options_headers(COLLECTION_METHODS, &headers))
}

/// Supported methods on a single token
///
/// OPTIONS /v1/tokens/:id
pub async fn resource_options(headers: HeaderMap) -> (StatusCode, HeaderMap) {
    (StatusCode::OK, options_headers(RESOURCE_METHODS, &headers))
}
