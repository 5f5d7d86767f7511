//! services/api/src/web/sessions.rs
//!
//! Endpoints for logging study sessions and reading aggregated statistics.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use study_tracker_core::domain::{
    CategoryBreakdown, DailyActivity, Identity, LanguageStats, OverallStats, SessionWithLanguage,
};
use study_tracker_core::streak::{self, StreakSummary};
use study_tracker_core::validation::{validate_new_session, validate_session_changes, SessionDraft};
use tracing::info;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::error::ApiResult;
use crate::web::extract::{json_body, path_param, query_params};
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Body for creating or editing a session. `language_id` is only read on
/// creation; a session cannot be moved to another language.
#[derive(Deserialize, ToSchema)]
pub struct SessionRequest {
    pub language_id: Option<Uuid>,
    /// One of Reading, Listening, Speaking, Writing, Grammar, Vocabulary, Other.
    pub category: Option<String>,
    pub duration_minutes: Option<i64>,
    /// Calendar date, `YYYY-MM-DD`.
    pub date: Option<String>,
    pub notes: Option<String>,
}

impl From<SessionRequest> for SessionDraft {
    fn from(req: SessionRequest) -> Self {
        SessionDraft {
            language_id: req.language_id,
            category: req.category,
            duration_minutes: req.duration_minutes,
            date: req.date,
            notes: req.notes,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CreatedResponse {
    pub id: Uuid,
}

#[derive(Serialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub language_id: Uuid,
    pub language_name: String,
    pub category: String,
    pub duration_minutes: i32,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<SessionWithLanguage> for SessionResponse {
    fn from(row: SessionWithLanguage) -> Self {
        let s = row.session;
        Self {
            id: s.id,
            user_id: s.user_id,
            language_id: s.language_id,
            language_name: row.language_name,
            category: s.category.to_string(),
            duration_minutes: s.duration_minutes,
            date: s.date,
            notes: s.notes,
            created_at: s.created_at,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct CategoryBreakdownResponse {
    pub category: String,
    pub total_minutes: i64,
    pub session_count: i64,
}

impl From<CategoryBreakdown> for CategoryBreakdownResponse {
    fn from(c: CategoryBreakdown) -> Self {
        Self {
            category: c.category.to_string(),
            total_minutes: c.total_minutes,
            session_count: c.session_count,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LanguageStatsResponse {
    pub total_minutes: i64,
    pub by_category: Vec<CategoryBreakdownResponse>,
}

impl From<LanguageStats> for LanguageStatsResponse {
    fn from(stats: LanguageStats) -> Self {
        Self {
            total_minutes: stats.total_minutes,
            by_category: stats.by_category.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct TopLanguageResponse {
    pub name: String,
    pub total_minutes: i64,
}

#[derive(Serialize, ToSchema)]
pub struct OverallStatsResponse {
    pub total_minutes: i64,
    /// `null` until the first session is logged.
    pub top_language: Option<TopLanguageResponse>,
}

impl From<OverallStats> for OverallStatsResponse {
    fn from(stats: OverallStats) -> Self {
        Self {
            total_minutes: stats.total_minutes,
            top_language: stats.top_language.map(|t| TopLanguageResponse {
                name: t.name,
                total_minutes: t.total_minutes,
            }),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct DailyActivityResponse {
    pub date: NaiveDate,
    pub total_minutes: i64,
    pub session_count: i64,
}

impl From<DailyActivity> for DailyActivityResponse {
    fn from(day: DailyActivity) -> Self {
        Self {
            date: day.date,
            total_minutes: day.total_minutes,
            session_count: day.session_count,
        }
    }
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreakQuery {
    /// The caller's local date, `YYYY-MM-DD`. Defaults to the server's UTC date.
    pub today: Option<NaiveDate>,
}

#[derive(Serialize, ToSchema)]
pub struct StreakResponse {
    pub current_streak: u32,
    pub longest_streak: u32,
    pub active_days: u32,
}

impl From<StreakSummary> for StreakResponse {
    fn from(s: StreakSummary) -> Self {
        Self {
            current_streak: s.current_streak,
            longest_streak: s.longest_streak,
            active_days: s.active_days,
        }
    }
}

//=========================================================================================
// Listing Handlers
//=========================================================================================

/// All of the caller's sessions, newest date first.
#[utoipa::path(
    get,
    path = "/api/sessions",
    tag = "sessions",
    responses(
        (status = 200, description = "Sessions with their language name", body = [SessionResponse]),
        (status = 401, description = "Missing or invalid token")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let sessions = state.db.list_sessions(identity.user_id, None).await?;
    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/sessions/language/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Language id")),
    responses(
        (status = 200, description = "Sessions of one language", body = [SessionResponse]),
        (status = 404, description = "No such language for this user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_language_sessions_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<Vec<SessionResponse>>> {
    let language_id = path_param(id)?;
    let sessions = state
        .db
        .list_sessions(identity.user_id, Some(language_id))
        .await?;
    Ok(Json(sessions.into_iter().map(Into::into).collect()))
}

//=========================================================================================
// Statistics Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/api/sessions/stats/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Language id")),
    responses(
        (status = 200, description = "Total and per-category minutes", body = LanguageStatsResponse),
        (status = 404, description = "No such language for this user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn language_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<LanguageStatsResponse>> {
    let language_id = path_param(id)?;
    let stats = state
        .db
        .language_stats(identity.user_id, language_id)
        .await?;
    Ok(Json(stats.into()))
}

#[utoipa::path(
    get,
    path = "/api/sessions/overall-stats",
    tag = "sessions",
    responses(
        (status = 200, description = "Total minutes and the most studied language", body = OverallStatsResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn overall_stats_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<OverallStatsResponse>> {
    let stats = state.db.overall_stats(identity.user_id).await?;
    Ok(Json(stats.into()))
}

#[utoipa::path(
    get,
    path = "/api/sessions/daily-activity",
    tag = "sessions",
    responses(
        (status = 200, description = "Minutes per calendar day, oldest first", body = [DailyActivityResponse])
    ),
    security(("bearer_auth" = []))
)]
pub async fn daily_activity_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Json<Vec<DailyActivityResponse>>> {
    let days = state.db.daily_activity(identity.user_id).await?;
    Ok(Json(days.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/sessions/streak",
    tag = "sessions",
    params(StreakQuery),
    responses(
        (status = 200, description = "Current and longest run of active days", body = StreakResponse),
        (status = 400, description = "Malformed date")
    ),
    security(("bearer_auth" = []))
)]
pub async fn streak_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    query: Result<Query<StreakQuery>, QueryRejection>,
) -> ApiResult<Json<StreakResponse>> {
    let today = query_params(query)?
        .today
        .unwrap_or_else(|| Utc::now().date_naive());
    let days = state.db.daily_activity(identity.user_id).await?;
    Ok(Json(streak::summarize(&days, today).into()))
}

//=========================================================================================
// Mutation Handlers
//=========================================================================================

/// Log a session against one of the caller's languages.
#[utoipa::path(
    post,
    path = "/api/sessions",
    tag = "sessions",
    request_body = SessionRequest,
    responses(
        (status = 201, description = "Session logged", body = CreatedResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 404, description = "The language does not belong to the caller")
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let draft = SessionDraft::from(json_body(payload)?);
    let new_session = validate_new_session(&draft)?;

    let session = state
        .db
        .create_session(identity.user_id, &new_session)
        .await?;
    info!(
        user_id = %identity.user_id,
        session_id = %session.id,
        language_id = %session.language_id,
        minutes = session.duration_minutes,
        "Session logged"
    );

    Ok((StatusCode::CREATED, Json(CreatedResponse { id: session.id })))
}

#[utoipa::path(
    put,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    request_body = SessionRequest,
    responses(
        (status = 200, description = "Session updated", body = MessageResponse),
        (status = 400, description = "Missing or invalid fields"),
        (status = 404, description = "No such session for this user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<SessionRequest>, JsonRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let session_id = path_param(id)?;
    let draft = SessionDraft::from(json_body(payload)?);
    let changes = validate_session_changes(&draft)?;

    state
        .db
        .update_session(identity.user_id, session_id, &changes)
        .await?;
    info!(user_id = %identity.user_id, %session_id, "Session updated");

    Ok(Json(MessageResponse::new("Session updated")))
}

#[utoipa::path(
    delete,
    path = "/api/sessions/{id}",
    tag = "sessions",
    params(("id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session deleted", body = MessageResponse),
        (status = 404, description = "No such session for this user")
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_session_handler(
    State(state): State<Arc<AppState>>,
    Extension(identity): Extension<Identity>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let session_id = path_param(id)?;

    state
        .db
        .delete_session(identity.user_id, session_id)
        .await?;
    info!(user_id = %identity.user_id, %session_id, "Session deleted");

    Ok(Json(MessageResponse::new("Session deleted")))
}
