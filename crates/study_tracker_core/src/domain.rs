//! crates/study_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Users
//=========================================================================================

/// The public projection of an account. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// A validated registration, with the password already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// The identity carried inside a session token.
///
/// Handlers scope every query by `user_id`. The claims are taken from the token
/// as-is, so a username change is only visible after the next login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
        }
    }
}

/// A signed token together with the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

//=========================================================================================
// Languages
//=========================================================================================

/// A study target owned by a single user. Names are unique per owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Language {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A language annotated with the minutes logged against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSummary {
    pub language: Language,
    pub total_minutes: i64,
}

//=========================================================================================
// Study sessions
//=========================================================================================

/// The fixed set of activity labels a study session can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    Reading,
    Listening,
    Speaking,
    Writing,
    Grammar,
    Vocabulary,
    Other,
}

impl Category {
    pub const ALL: [Category; 7] = [
        Category::Reading,
        Category::Listening,
        Category::Speaking,
        Category::Writing,
        Category::Grammar,
        Category::Vocabulary,
        Category::Other,
    ];

    /// The canonical label, as stored and as returned to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Reading => "Reading",
            Category::Listening => "Listening",
            Category::Speaking => "Speaking",
            Category::Writing => "Writing",
            Category::Grammar => "Grammar",
            Category::Vocabulary => "Vocabulary",
            Category::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a known category")]
pub struct UnknownCategory(pub String);

impl FromStr for Category {
    type Err = UnknownCategory;

    /// Matches labels case-insensitively ("reading" and "READING" both parse).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}

/// A logged interval of study.
///
/// `user_id` is denormalized from the language so every query can be scoped
/// directly. Owner and language never change after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudySession {
    pub id: Uuid,
    pub user_id: Uuid,
    pub language_id: Uuid,
    pub category: Category,
    pub duration_minutes: i32,
    pub date: NaiveDate,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A session joined with the name of its language, as shown in listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionWithLanguage {
    pub session: StudySession,
    pub language_name: String,
}

/// A validated session ready to be inserted for the calling user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewStudySession {
    pub language_id: Uuid,
    pub category: Category,
    pub duration_minutes: i32,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

/// The editable fields of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionChanges {
    pub category: Category,
    pub duration_minutes: i32,
    pub date: NaiveDate,
    pub notes: Option<String>,
}

//=========================================================================================
// Aggregates
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryBreakdown {
    pub category: Category,
    pub total_minutes: i64,
    pub session_count: i64,
}

/// Totals for a single language. Categories without sessions are omitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageStats {
    pub total_minutes: i64,
    pub by_category: Vec<CategoryBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopLanguage {
    pub name: String,
    pub total_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverallStats {
    pub total_minutes: i64,
    /// `None` when the user has not logged any session yet.
    pub top_language: Option<TopLanguage>,
}

/// Minutes and session count for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub total_minutes: i64,
    pub session_count: i64,
}
