//! crates/study_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like the database,
//! the password hashing scheme, or the token format.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    DailyActivity, Identity, IssuedToken, Language, LanguageStats, LanguageSummary,
    NewStudySession, NewUser, OverallStats, SessionChanges, SessionWithLanguage, StudySession,
    User, UserCredentials,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A single rejected input field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, crypto).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Invalid input: {}", summarize(.0))]
    Validation(Vec<FieldError>),
    #[error("Username or email already exists")]
    DuplicateIdentity,
    #[error("{0} already exists")]
    DuplicateName(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistence for users, languages and study sessions.
///
/// Every method taking an `owner` must only see and touch rows belonging to
/// that user. A row owned by someone else is reported as `NotFound`, exactly
/// like a row that does not exist.
#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Users ---
    /// Fails with `DuplicateIdentity` when the username or email is taken.
    async fn create_user(&self, user: &NewUser) -> PortResult<User>;

    /// Looks the user up by email or by username, whichever matches `identifier`.
    async fn find_user_by_identifier(&self, identifier: &str) -> PortResult<UserCredentials>;

    async fn get_user(&self, user_id: Uuid) -> PortResult<User>;

    // --- Languages ---
    /// Ordered by total minutes descending, then newest first.
    async fn list_languages(&self, owner: Uuid) -> PortResult<Vec<LanguageSummary>>;

    async fn get_language(&self, owner: Uuid, language_id: Uuid) -> PortResult<Language>;

    /// Fails with `DuplicateName` when the owner already has a language with this name.
    async fn create_language(&self, owner: Uuid, name: &str) -> PortResult<Language>;

    async fn rename_language(
        &self,
        owner: Uuid,
        language_id: Uuid,
        name: &str,
    ) -> PortResult<Language>;

    /// Removes the language and, through the schema, all of its sessions.
    async fn delete_language(&self, owner: Uuid, language_id: Uuid) -> PortResult<()>;

    // --- Study Sessions ---
    /// Ordered by date descending, then newest first. `language_id` narrows the
    /// listing to a single language.
    async fn list_sessions(
        &self,
        owner: Uuid,
        language_id: Option<Uuid>,
    ) -> PortResult<Vec<SessionWithLanguage>>;

    /// Fails with `NotFound` when the referenced language is not owned by `owner`.
    async fn create_session(
        &self,
        owner: Uuid,
        session: &NewStudySession,
    ) -> PortResult<StudySession>;

    async fn update_session(
        &self,
        owner: Uuid,
        session_id: Uuid,
        changes: &SessionChanges,
    ) -> PortResult<StudySession>;

    async fn delete_session(&self, owner: Uuid, session_id: Uuid) -> PortResult<()>;

    // --- Aggregates ---
    async fn language_stats(&self, owner: Uuid, language_id: Uuid) -> PortResult<LanguageStats>;

    async fn overall_stats(&self, owner: Uuid) -> PortResult<OverallStats>;

    /// Per-date totals, ascending by date.
    async fn daily_activity(&self, owner: Uuid) -> PortResult<Vec<DailyActivity>>;
}

/// One-way, salted password hashing.
pub trait PasswordService: Send + Sync {
    fn hash(&self, password: &str) -> PortResult<String>;

    /// Returns `Ok(false)` for a wrong password; `Err` only for a malformed hash.
    fn verify(&self, password: &str, hash: &str) -> PortResult<bool>;
}

/// Issues and verifies signed session tokens carrying an [`Identity`].
pub trait TokenService: Send + Sync {
    fn issue(&self, identity: &Identity) -> PortResult<IssuedToken>;

    /// Fails with `Unauthenticated` on a bad signature or an expired token.
    fn verify(&self, token: &str) -> PortResult<Identity>;
}
