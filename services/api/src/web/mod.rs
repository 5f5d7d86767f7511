pub mod auth;
pub mod extract;
pub mod languages;
pub mod middleware;
pub mod rest;
pub mod sessions;
pub mod state;

use axum::{
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use middleware::require_auth;
pub use state::AppState;

/// Every route lives under this prefix.
pub const API_PREFIX: &str = "/api";

/// Builds the API router shared by the server binary and the integration tests.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(rest::health_handler))
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler));

    // Protected routes (bearer token required)
    let protected_routes = Router::new()
        .route("/auth/me", get(auth::me_handler))
        .route(
            "/languages",
            get(languages::list_languages_handler).post(languages::create_language_handler),
        )
        .route(
            "/languages/{id}",
            put(languages::rename_language_handler).delete(languages::delete_language_handler),
        )
        .route(
            "/sessions",
            get(sessions::list_sessions_handler).post(sessions::create_session_handler),
        )
        .route(
            "/sessions/{id}",
            put(sessions::update_session_handler).delete(sessions::delete_session_handler),
        )
        .route(
            "/sessions/language/{id}",
            get(sessions::list_language_sessions_handler),
        )
        .route("/sessions/stats/{id}", get(sessions::language_stats_handler))
        .route("/sessions/overall-stats", get(sessions::overall_stats_handler))
        .route("/sessions/daily-activity", get(sessions::daily_activity_handler))
        .route("/sessions/streak", get(sessions::streak_handler))
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            require_auth,
        ));

    Router::new()
        .nest(API_PREFIX, public_routes.merge(protected_routes))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
