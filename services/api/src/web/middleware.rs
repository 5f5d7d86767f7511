//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use study_tracker_core::ports::PortError;
use tracing::debug;

use crate::error::ApiError;
use crate::web::state::AppState;

/// Middleware that validates the bearer token and extracts the caller's identity.
///
/// If valid, inserts the `Identity` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // 1. Extract the Authorization header
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| PortError::Unauthenticated("missing Authorization header".to_string()))?;

    // 2. Strip the scheme
    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| PortError::Unauthenticated("expected a Bearer token".to_string()))?;

    // 3. Verify signature and expiry
    let identity = state.accounts.verify_token(token).map_err(|e| {
        debug!(error = %e, "Rejected bearer token");
        e
    })?;

    // 4. Insert the identity into request extensions
    req.extensions_mut().insert(identity);

    // 5. Continue to the handler
    Ok(next.run(req).await)
}
