//! services/api/src/web/rest.rs
//!
//! Shared REST payloads, the health endpoint, and the master definition for
//! the OpenAPI specification.

use axum::response::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};

use crate::web::{auth, languages, sessions};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        auth::register_handler,
        auth::login_handler,
        auth::me_handler,
        languages::list_languages_handler,
        languages::create_language_handler,
        languages::rename_language_handler,
        languages::delete_language_handler,
        sessions::list_sessions_handler,
        sessions::list_language_sessions_handler,
        sessions::language_stats_handler,
        sessions::overall_stats_handler,
        sessions::daily_activity_handler,
        sessions::streak_handler,
        sessions::create_session_handler,
        sessions::update_session_handler,
        sessions::delete_session_handler,
    ),
    components(
        schemas(
            HealthResponse,
            MessageResponse,
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::AuthResponse,
            auth::UserResponse,
            languages::LanguageNameRequest,
            languages::LanguageResponse,
            languages::LanguageSummaryResponse,
            sessions::SessionRequest,
            sessions::SessionResponse,
            sessions::CreatedResponse,
            sessions::LanguageStatsResponse,
            sessions::CategoryBreakdownResponse,
            sessions::OverallStatsResponse,
            sessions::TopLanguageResponse,
            sessions::DailyActivityResponse,
            sessions::StreakResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Liveness."),
        (name = "auth", description = "Registration and login."),
        (name = "languages", description = "The languages a user studies."),
        (name = "sessions", description = "Logged study time and statistics.")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// Shared Payloads
//=========================================================================================

/// A plain confirmation returned by update and delete endpoints.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
}

//=========================================================================================
// Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "health",
    responses((status = 200, description = "Service is up", body = HealthResponse))
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        timestamp: Utc::now(),
    })
}
