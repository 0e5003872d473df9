use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use super::auth::CurrentUser;
use crate::api::errors::ApiError;
use crate::api::state::AppState;
use crate::domain::rate_limit::RateLimitDecision;

pub const RATE_LIMIT_LIMIT: &str = "x-rate-limit-limit";
pub const RATE_LIMIT_REMAINING: &str = "x-rate-limit-remaining";
pub const RATE_LIMIT_RESET: &str = "x-rate-limit-reset";

/// Per-user rate limiter
///
/// Runs after [`super::authenticate`]; requests without a [`CurrentUser`]
/// are not charged.
pub async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let Some(CurrentUser(user)) = request.extensions().get::<CurrentUser>().cloned() else {
        return next.run(request).await;
    };

    let decision = match state
        .users
        .consume_allowance(user.id, Utc::now().timestamp())
        .await
    {
        Ok(decision) => decision,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let mut response = if decision.allowed {
        next.run(request).await
    } else {
        tracing::info!(user_id = %user.id, limit = decision.limit, "rate limit exceeded");
        ApiError::too_many_requests("Rate limit exceeded.").into_response()
    };

    if state.config.rate_limit_headers {
        add_rate_limit_headers(response.headers_mut(), &decision);
    }

    response
}

/// Writes the `X-Rate-Limit-*` headers for a decision
pub fn add_rate_limit_headers(headers: &mut HeaderMap, decision: &RateLimitDecision) {
    for (name, value) in [
        (RATE_LIMIT_LIMIT, decision.limit),
        (RATE_LIMIT_REMAINING, decision.remaining),
        (RATE_LIMIT_RESET, decision.reset),
    ] {
        headers.insert(HeaderName::from_static(name), HeaderValue::from(value));
    }
}
