//! services/api/src/web/languages.rs
//!
//! CRUD endpoints for the caller's languages.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_tracker_core::domain::{Identity, Language, LanguageSummary};
use study_tracker_core::validation::validate_language_name;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::web::extract::{json_body, path_param};
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LanguageNameRequest {
    pub name: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LanguageResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Language> for LanguageResponse {
    fn from(language: Language) -> Self {
        Self {
            id: language.id,
            user_id: language.user_id,
            name: language.name,
            created_at: language.created_at,
        }
    }
}

/// A language with the minutes logged against it.
#[derive(Serialize, ToSchema)]
pub struct LanguageSummaryResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub total_minutes: i64,
}

impl From<LanguageSummary> for LanguageSummaryResponse {
    fn from(summary: LanguageSummary) -> Self {
        Self {
            id: summary.language.id,
            user_id: summary.language.user_id,
            name: summary.language.name,
            created_at: summary.language.created_at,
            total_minutes: summary.total_minutes,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// List the caller's languages, most studied first.
#[utoipa::path(
    get,
    path = "/api/languages",
    tag = "languages",
    responses(
        (status = 200, description = "Languages with their total minutes", body = [LanguageSummaryResponse]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_languages_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<LanguageSummaryResponse>>> {
    let languages = state.db.list_languages(identity.user_id).await?;
    Ok(Json(languages.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/api/languages",
    tag = "languages",
    request_body = LanguageNameRequest,
    responses(
        (status = 201, description = "Language created", body = LanguageResponse),
        (status = 400, description = "Empty name or the caller already has this language"),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_language_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<LanguageNameRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let req = json_body(payload)?;
    let name = validate_language_name(req.name.as_deref())?;

    let language = state.db.create_language(identity.user_id, &name).await?;
    info!(user_id = %identity.user_id, language_id = %language.id, "Language created");

    Ok((StatusCode::CREATED, Json(LanguageResponse::from(language))))
}

#[utoipa::path(
    put,
    path = "/api/languages/{id}",
    tag = "languages",
    params(("id" = Uuid, Path, description = "Language id")),
    request_body = LanguageNameRequest,
    responses(
        (status = 200, description = "Language renamed", body = MessageResponse),
        (status = 400, description = "Empty name or the caller already has this language"),
        (status = 404, description = "No such language for this user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn rename_language_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<LanguageNameRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let language_id = path_param(id)?;
    let req = json_body(payload)?;
    let name = validate_language_name(req.name.as_deref())?;

    state
        .db
        .rename_language(identity.user_id, language_id, &name)
        .await?;
    info!(user_id = %identity.user_id, %language_id, "Language renamed");

    Ok(Json(MessageResponse::new("Language updated")))
}

/// Delete a language together with all of its sessions.
#[utoipa::path(
    delete,
    path = "/api/languages/{id}",
    tag = "languages",
    params(("id" = Uuid, Path, description = "Language id")),
    responses(
        (status = 200, description = "Language deleted", body = MessageResponse),
        (status = 404, description = "No such language for this user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_language_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let language_id = path_param(id)?;

    state
        .db
        .delete_language(identity.user_id, language_id)
        .await?;
    info!(user_id = %identity.user_id, %language_id, "Language deleted");

    Ok(Json(MessageResponse::new("Language deleted")))
}
