//! crates/study_tracker_core/src/validation.rs
//!
//! Turns loosely-typed client input into validated domain values.
//!
//! Every check runs before anything is persisted, and all failures of one
//! request are collected so the client can report them field by field.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::domain::{Category, NewStudySession, SessionChanges};
use crate::ports::{FieldError, PortError, PortResult};

pub const MIN_PASSWORD_LENGTH: usize = 6;
pub const MAX_LANGUAGE_NAME_LENGTH: usize = 100;

/// Calendar dates are exchanged as `YYYY-MM-DD`, never as timestamps.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

//=========================================================================================
// Raw Input
//=========================================================================================

#[derive(Debug, Clone, Default)]
pub struct RegistrationDraft {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionDraft {
    pub language_id: Option<Uuid>,
    pub category: Option<String>,
    pub duration_minutes: Option<i64>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

//=========================================================================================
// Validated Output
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginAttempt {
    pub identifier: String,
    pub password: String,
}

//=========================================================================================
// Validators
//=========================================================================================

pub fn validate_registration(draft: &RegistrationDraft) -> PortResult<Registration> {
    let mut errors = Vec::new();

    let username = required_text(&draft.username, "username", &mut errors);
    let email = required_text(&draft.email, "email", &mut errors);

    // Passwords are taken verbatim; surrounding spaces are part of the secret.
    let password = match draft.password.as_deref() {
        None | Some("") => {
            errors.push(FieldError::new("password", "password is required"));
            None
        }
        Some(p) if p.chars().count() < MIN_PASSWORD_LENGTH => {
            errors.push(FieldError::new(
                "password",
                format!("password must be at least {MIN_PASSWORD_LENGTH} characters"),
            ));
            None
        }
        Some(p) => Some(p.to_string()),
    };

    match (username, email, password) {
        (Some(username), Some(email), Some(password)) if errors.is_empty() => Ok(Registration {
            username,
            email,
            password,
        }),
        _ => Err(PortError::Validation(errors)),
    }
}

pub fn validate_login(identifier: Option<&str>, password: Option<&str>) -> PortResult<LoginAttempt> {
    let mut errors = Vec::new();

    let identifier = required_text(&identifier.map(str::to_string), "email", &mut errors);
    let password = match password {
        None | Some("") => {
            errors.push(FieldError::new("password", "password is required"));
            None
        }
        Some(p) => Some(p.to_string()),
    };

    match (identifier, password) {
        (Some(identifier), Some(password)) => Ok(LoginAttempt {
            identifier,
            password,
        }),
        _ => Err(PortError::Validation(errors)),
    }
}

pub fn validate_language_name(name: Option<&str>) -> PortResult<String> {
    let mut errors = Vec::new();
    let name = required_text(&name.map(str::to_string), "name", &mut errors);

    match name {
        Some(name) if name.chars().count() > MAX_LANGUAGE_NAME_LENGTH => {
            Err(PortError::Validation(vec![FieldError::new(
                "name",
                format!("name must be at most {MAX_LANGUAGE_NAME_LENGTH} characters"),
            )]))
        }
        Some(name) => Ok(name),
        None => Err(PortError::Validation(errors)),
    }
}

pub fn validate_new_session(draft: &SessionDraft) -> PortResult<NewStudySession> {
    let mut errors = Vec::new();

    let language_id = draft.language_id;
    if language_id.is_none() {
        errors.push(FieldError::new("language_id", "language_id is required"));
    }
    let fields = session_fields(draft, &mut errors);

    match (language_id, fields) {
        (Some(language_id), Some(changes)) if errors.is_empty() => Ok(NewStudySession {
            language_id,
            category: changes.category,
            duration_minutes: changes.duration_minutes,
            date: changes.date,
            notes: changes.notes,
        }),
        _ => Err(PortError::Validation(errors)),
    }
}

/// Validates an edit. Any `language_id` in the draft is ignored: a session
/// stays attached to the language it was logged against.
pub fn validate_session_changes(draft: &SessionDraft) -> PortResult<SessionChanges> {
    let mut errors = Vec::new();
    match session_fields(draft, &mut errors) {
        Some(changes) if errors.is_empty() => Ok(changes),
        _ => Err(PortError::Validation(errors)),
    }
}

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

//=========================================================================================
// Helpers
//=========================================================================================

fn session_fields(draft: &SessionDraft, errors: &mut Vec<FieldError>) -> Option<SessionChanges> {
    let category = match draft.category.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new("category", "category is required"));
            None
        }
        Some(raw) => match raw.parse::<Category>() {
            Ok(category) => Some(category),
            Err(e) => {
                let allowed: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
                errors.push(FieldError::new(
                    "category",
                    format!("{e}; expected one of {}", allowed.join(", ")),
                ));
                None
            }
        },
    };

    let duration_minutes = match draft.duration_minutes {
        None => {
            errors.push(FieldError::new(
                "duration_minutes",
                "duration_minutes is required",
            ));
            None
        }
        Some(minutes) if minutes <= 0 => {
            errors.push(FieldError::new(
                "duration_minutes",
                "duration_minutes must be a positive integer",
            ));
            None
        }
        Some(minutes) => match i32::try_from(minutes) {
            Ok(minutes) => Some(minutes),
            Err(_) => {
                errors.push(FieldError::new(
                    "duration_minutes",
                    "duration_minutes is too large",
                ));
                None
            }
        },
    };

    let date = match draft.date.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new("date", "date is required"));
            None
        }
        Some(raw) => match parse_date(raw) {
            Some(date) => Some(date),
            None => {
                errors.push(FieldError::new("date", "date must be formatted as YYYY-MM-DD"));
                None
            }
        },
    };

    let notes = draft
        .notes
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    Some(SessionChanges {
        category: category?,
        duration_minutes: duration_minutes?,
        date: date?,
        notes,
    })
}

fn required_text(
    value: &Option<String>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<String> {
    match value.as_deref().map(str::trim) {
        None | Some("") => {
            errors.push(FieldError::new(field, format!("{field} is required")));
            None
        }
        Some(v) => Some(v.to_string()),
    }
}
