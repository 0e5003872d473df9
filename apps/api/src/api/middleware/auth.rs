use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::user::User;

/// The user resolved from the bearer token of the current request
///
/// Inserted into request extensions by [`authenticate`]; handlers take it
/// as an extractor.
///
/// Usage:
/// ```rust,ignore
/// async fn protected_handler(CurrentUser(user): CurrentUser) -> String {
///     format!("Hello {}", user.username)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extracts the credential from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing authorization header"))?;

    auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Invalid authorization format. Use: Bearer <token>"))
}

/// Bearer authentication filter
///
/// Resolves the token to an active user and stores it as [`CurrentUser`].
pub async fn authenticate(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers())?.to_owned();
    let user = state
        .users
        .find_identity_by_access_token(&token)
        .await?
        .ok_or_else(|| {
            tracing::debug!("rejected unknown bearer token");
            ApiError::unauthorized("Your request was made with invalid credentials.")
        })?;

    tracing::debug!(user_id = %user.id, "authenticated request");
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderValue, StatusCode};

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers("Bearer abc123");
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn missing_header_is_unauthorized() {
        let err = bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.status, StatusCode::UNAUTHORIZED);
        assert_eq!(err.message, "Missing authorization header");
    }

    #[test]
    fn other_schemes_are_rejected() {
        assert!(bearer_token(&headers("Basic dXNlcjpwYXNz")).is_err());
        assert!(bearer_token(&headers("Bearer ")).is_err());
    }
}
