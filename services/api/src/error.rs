//! services/api/src/error.rs
//!
//! Defines the primary error type for the entire API service and how each
//! failure is presented to HTTP clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use study_tracker_core::ports::{FieldError, PortError};
use tracing::error;

use crate::config::ConfigError;

/// The primary error type for the `api` service.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// Represents an error from the underlying database library.
    #[error("Database Error: {0}")]
    Database(#[from] sqlx::Error),

    /// Represents an error from running the schema migrations at startup.
    #[error("Migration Error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Represents a standard Input/Output error (e.g., binding to a network socket).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A request body or parameter that could not be decoded at all.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

/// Convenience type alias for handler return values.
pub type ApiResult<T> = Result<T, ApiError>;

const INTERNAL_MESSAGE: &str = "An internal error occurred";

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::Port(port) => match port {
                PortError::Validation(_) => (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_ERROR",
                    port.to_string(),
                ),
                PortError::DuplicateIdentity => (
                    StatusCode::BAD_REQUEST,
                    "DUPLICATE_IDENTITY",
                    port.to_string(),
                ),
                PortError::DuplicateName(_) => {
                    (StatusCode::BAD_REQUEST, "DUPLICATE_NAME", port.to_string())
                }
                PortError::InvalidCredentials => (
                    StatusCode::UNAUTHORIZED,
                    "INVALID_CREDENTIALS",
                    port.to_string(),
                ),
                PortError::Unauthenticated(_) => (
                    StatusCode::UNAUTHORIZED,
                    "UNAUTHENTICATED",
                    "Authentication required".to_string(),
                ),
                PortError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", port.to_string()),
                PortError::Unexpected(_) => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    INTERNAL_MESSAGE.to_string(),
                ),
            },
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Config(_)
            | ApiError::Database(_)
            | ApiError::Migration(_)
            | ApiError::Io(_)
            | ApiError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                INTERNAL_MESSAGE.to_string(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        if status.is_server_error() {
            // Full detail stays in the logs; the client only sees the generic message.
            error!(error = %self, "Request failed");
        }

        let mut body = json!({
            "error": message,
            "code": code,
        });
        if let ApiError::Port(PortError::Validation(fields)) = &self {
            body["fields"] = json!(fields.iter().map(field_json).collect::<Vec<_>>());
        }

        (status, Json(body)).into_response()
    }
}

fn field_json(field: &FieldError) -> serde_json::Value {
    json!({ "field": field.field, "message": field.message })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn render(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("body should be readable")
            .to_bytes();
        (status, serde_json::from_slice(&bytes).expect("body should be json"))
    }

    #[tokio::test]
    async fn validation_errors_list_their_fields() {
        let err = ApiError::Port(PortError::Validation(vec![FieldError::new(
            "duration_minutes",
            "duration_minutes must be a positive integer",
        )]));
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["fields"][0]["field"], "duration_minutes");
    }

    #[tokio::test]
    async fn duplicates_are_client_errors() {
        let (status, body) = render(ApiError::Port(PortError::DuplicateIdentity)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Username or email already exists");

        let (status, _) =
            render(ApiError::Port(PortError::DuplicateName("Language 'Spanish'".into()))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn auth_failures_are_unauthorized() {
        let (status, body) = render(ApiError::Port(PortError::InvalidCredentials)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Invalid credentials");

        let (status, body) =
            render(ApiError::Port(PortError::Unauthenticated("ExpiredSignature".into()))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Authentication required");
    }

    #[tokio::test]
    async fn storage_detail_never_reaches_the_client() {
        let (status, body) = render(ApiError::Port(PortError::Unexpected(
            "relation \"languages\" does not exist".into(),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], INTERNAL_MESSAGE);

        let (status, body) = render(ApiError::Database(sqlx::Error::PoolTimedOut)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], INTERNAL_MESSAGE);
    }

    #[tokio::test]
    async fn not_found_names_the_resource() {
        let (status, body) = render(ApiError::Port(PortError::NotFound("Session".into()))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Session not found");
    }
}
