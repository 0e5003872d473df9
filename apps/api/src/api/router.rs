use std::convert::Infallible;

use axum::{
    middleware,
    routing::{get, post, MethodRouter},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{apis, auth, tokens};
use super::middleware::{authenticate, rate_limit};
use super::state::AppState;

/// Builds the full application router
///
/// Protected methods run CORS, then bearer authentication, then the rate
/// limiter. `OPTIONS` on the token resource is registered after those
/// layers, so it stays public and is answered by the options handlers.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/apis", guarded(&state, &cors, get(apis::index)))
        .route(
            "/tokens",
            guarded(&state, &cors, get(tokens::list_tokens).post(tokens::create_token))
                .options(tokens::collection_options),
        )
        .route(
            "/tokens/:id",
            guarded(
                &state,
                &cors,
                get(tokens::get_token)
                    .put(tokens::update_token)
                    .patch(tokens::update_token)
                    .delete(tokens::delete_token),
            )
            .options(tokens::resource_options),
        );

    let public = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/password-reset", post(auth::request_password_reset))
        .route(
            "/auth/password-reset/confirm",
            post(auth::confirm_password_reset),
        )
        .layer(cors);

    Router::new()
        .route("/health", get(auth::health_check))
        .nest("/v1", public.merge(protected))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wraps protected methods in the rate limiter, authentication, and CORS
fn guarded(
    state: &AppState,
    cors: &CorsLayer,
    methods: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    methods
        .layer::<_, Infallible>(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer::<_, Infallible>(middleware::from_fn_with_state(state.clone(), authenticate))
        .layer(cors.clone())
}
