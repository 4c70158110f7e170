//! Route definitions for the Tokenguard HTTP API.
//!
//! All routes are mounted under `/api`. Routes behind
//! [`require_auth`](crate::middleware::auth::require_auth) see an
//! [`AuthUser`](crate::extractors::AuthUser) in their extensions.

use axum::{
    Router, middleware as axum_middleware,
    routing::{delete, get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .merge(me_routes())
        .merge(admin_routes())
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(health_routes())
        .merge(protected);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Login, refresh and logout validate the token themselves: refresh and
/// logout accept expired tokens.
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
}

fn me_routes() -> Router<AppState> {
    Router::new().route("/auth/me", get(handlers::auth::me))
}

fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/accounts", get(handlers::admin::list_accounts))
        .route(
            "/admin/sessions/{scene}/{id}",
            delete(handlers::admin::force_exit),
        )
        .route("/admin/tokens/{jti}", delete(handlers::admin::revoke_token))
}

fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
