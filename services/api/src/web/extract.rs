//! services/api/src/web/extract.rs
//!
//! Turns axum's extractor rejections into the API's JSON error shape.
//!
//! A body that parses as JSON but carries a field of the wrong type is a
//! validation failure on that field; anything that is not JSON at all is a
//! plain bad request.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query};
use axum::Json;
use study_tracker_core::ports::{FieldError, PortError};

use crate::error::{ApiError, ApiResult};

const DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Every field name a request body can carry.
const BODY_FIELDS: &[&str] = &[
    "username",
    "email",
    "identifier",
    "password",
    "name",
    "language_id",
    "category",
    "duration_minutes",
    "date",
    "notes",
];

pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> ApiResult<T> {
    payload.map(|Json(body)| body).map_err(|rejection| match rejection {
        JsonRejection::JsonDataError(err) => invalid_field(&err.body_text()),
        other => ApiError::BadRequest(other.body_text()),
    })
}

pub fn path_param<T>(param: Result<Path<T>, PathRejection>) -> ApiResult<T> {
    param
        .map(|Path(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub fn query_params<T>(query: Result<Query<T>, QueryRejection>) -> ApiResult<T> {
    query
        .map(|Query(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

/// serde reports data errors as `<path>: <reason>`; a bare reason means the
/// body as a whole had the wrong shape.
fn invalid_field(body_text: &str) -> ApiError {
    let detail = body_text
        .strip_prefix(DATA_ERROR_PREFIX)
        .unwrap_or(body_text);

    let error = detail
        .split_once(": ")
        .and_then(|(path, reason)| {
            BODY_FIELDS
                .iter()
                .find(|field| **field == path)
                .map(|field| FieldError::new(*field, format!("{field}: {reason}")))
        })
        .unwrap_or_else(|| FieldError::new("body", detail));

    ApiError::Port(PortError::Validation(vec![error]))
}
