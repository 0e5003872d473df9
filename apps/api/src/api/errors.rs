use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::domain::errors::DomainError;
use crate::domain::repositories::RepositoryError;

/// API error type with HTTP status code and message
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    /// Creates a new API error
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Creates a 400 Bad Request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    /// Creates a 401 Unauthorized error
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    /// Creates a 403 Forbidden error
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    /// Creates a 404 Not Found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    /// Creates a 429 Too Many Requests error
    pub fn too_many_requests(message: impl Into<String>) -> Self {
        Self::new(StatusCode::TOO_MANY_REQUESTS, message)
    }

    /// Creates a 500 Internal Server Error
    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message
        }));

        let mut response = (self.status, body).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer realm=\"api\""));
        }
        response
    }
}

impl From<RepositoryError> for ApiError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { .. } => Self::not_found(error.to_string()),
            RepositoryError::Duplicate(_) => Self::bad_request(error.to_string()),
            RepositoryError::Corrupt { .. } | RepositoryError::Database(_) => {
                tracing::error!(error = %error, "repository failure");
                Self::internal_server_error("Internal server error")
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(error: DomainError) -> Self {
        match error {
            DomainError::PasswordHash(_) => {
                tracing::error!(error = %error, "password hashing failure");
                Self::internal_server_error("Internal server error")
            }
            _ => Self::bad_request(error.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::new(rejection.status(), rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let error = ApiError::from(RepositoryError::NotFound {
            entity: "token",
            id: "abc".to_string(),
        });
        assert_eq!(error.status, StatusCode::NOT_FOUND);
        assert_eq!(error.message, "token not found: abc");
    }

    #[test]
    fn duplicate_maps_to_400() {
        let error = ApiError::from(RepositoryError::Duplicate("username".to_string()));
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn database_failure_is_not_leaked() {
        let error = ApiError::from(RepositoryError::Database(sqlx::Error::PoolTimedOut));
        assert_eq!(error.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.message, "Internal server error");
    }

    #[test]
    fn validation_failure_maps_to_400() {
        let error = ApiError::from(DomainError::BlankUsername);
        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.message, "Username cannot be blank");
    }

    #[test]
    fn unauthorized_carries_challenge() {
        let response = ApiError::unauthorized("nope").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            "Bearer realm=\"api\""
        );
    }
}
