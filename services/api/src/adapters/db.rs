//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Every statement touching languages or sessions carries the owner in its
//! `WHERE` clause, so rows of other users behave exactly like missing rows.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, PgPool};
use study_tracker_core::domain::{
    Category, CategoryBreakdown, DailyActivity, Language, LanguageStats, LanguageSummary,
    NewStudySession, NewUser, OverallStats, SessionChanges, SessionWithLanguage, StudySession,
    TopLanguage, User, UserCredentials,
};
use study_tracker_core::ports::{DatabaseService, PortError, PortResult};
use tracing::warn;
use uuid::Uuid;

/// SQLSTATE for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user: User {
                id: self.id,
                username: self.username,
                email: self.email,
                created_at: self.created_at,
            },
            password_hash: self.password_hash,
        }
    }
}

#[derive(FromRow)]
struct LanguageRecord {
    id: Uuid,
    user_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
}
impl LanguageRecord {
    fn to_domain(self) -> Language {
        Language {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct LanguageSummaryRecord {
    id: Uuid,
    user_id: Uuid,
    name: String,
    created_at: DateTime<Utc>,
    total_minutes: i64,
}
impl LanguageSummaryRecord {
    fn to_domain(self) -> LanguageSummary {
        LanguageSummary {
            language: Language {
                id: self.id,
                user_id: self.user_id,
                name: self.name,
                created_at: self.created_at,
            },
            total_minutes: self.total_minutes,
        }
    }
}

#[derive(FromRow)]
struct SessionRecord {
    id: Uuid,
    user_id: Uuid,
    language_id: Uuid,
    category: String,
    duration_minutes: i32,
    date: NaiveDate,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}
impl SessionRecord {
    fn to_domain(self) -> PortResult<StudySession> {
        Ok(StudySession {
            id: self.id,
            user_id: self.user_id,
            language_id: self.language_id,
            category: parse_category(&self.category)?,
            duration_minutes: self.duration_minutes,
            date: self.date,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct SessionWithLanguageRecord {
    #[sqlx(flatten)]
    session: SessionRecord,
    language_name: String,
}
impl SessionWithLanguageRecord {
    fn to_domain(self) -> PortResult<SessionWithLanguage> {
        Ok(SessionWithLanguage {
            session: self.session.to_domain()?,
            language_name: self.language_name,
        })
    }
}

#[derive(FromRow)]
struct CategoryRecord {
    category: String,
    total_minutes: i64,
    session_count: i64,
}
impl CategoryRecord {
    fn to_domain(self) -> PortResult<CategoryBreakdown> {
        Ok(CategoryBreakdown {
            category: parse_category(&self.category)?,
            total_minutes: self.total_minutes,
            session_count: self.session_count,
        })
    }
}

#[derive(FromRow)]
struct TopLanguageRecord {
    name: String,
    total_minutes: i64,
}

#[derive(FromRow)]
struct DailyActivityRecord {
    date: NaiveDate,
    total_minutes: i64,
    session_count: i64,
}

//=========================================================================================
// Error Mapping Helpers
//=========================================================================================

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION))
}

fn parse_category(raw: &str) -> PortResult<Category> {
    raw.parse::<Category>().map_err(|e| {
        warn!(category = raw, "Stored session has an unknown category");
        PortError::Unexpected(e.to_string())
    })
}

const SESSION_COLUMNS: &str =
    "s.id, s.user_id, s.language_id, s.category, s.duration_minutes, s.date, s.notes, s.created_at";

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, new_user: &NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "INSERT INTO users (id, username, email, password_hash) VALUES ($1, $2, $3, $4) \
             RETURNING id, username, email, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::DuplicateIdentity
            } else {
                unexpected(e)
            }
        })?;
        Ok(record.to_domain().user)
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, password_hash, created_at FROM users \
             WHERE email = $1 OR username = $1 \
             ORDER BY (email = $1) DESC LIMIT 1",
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound("User".to_string()))?;
        Ok(record.to_domain())
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("User {user_id}")))?;
        Ok(record.to_domain().user)
    }

    async fn list_languages(&self, owner: Uuid) -> PortResult<Vec<LanguageSummary>> {
        let records = sqlx::query_as::<_, LanguageSummaryRecord>(
            "SELECT l.id, l.user_id, l.name, l.created_at, \
                    COALESCE(SUM(s.duration_minutes), 0)::BIGINT AS total_minutes \
             FROM languages l \
             LEFT JOIN study_sessions s ON s.language_id = l.id \
             WHERE l.user_id = $1 \
             GROUP BY l.id \
             ORDER BY total_minutes DESC, l.created_at DESC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }

    async fn get_language(&self, owner: Uuid, language_id: Uuid) -> PortResult<Language> {
        let record = sqlx::query_as::<_, LanguageRecord>(
            "SELECT id, user_id, name, created_at FROM languages WHERE id = $1 AND user_id = $2",
        )
        .bind(language_id)
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .ok_or_else(|| PortError::NotFound(format!("Language {language_id}")))?;
        Ok(record.to_domain())
    }

    async fn create_language(&self, owner: Uuid, name: &str) -> PortResult<Language> {
        let record = sqlx::query_as::<_, LanguageRecord>(
            "INSERT INTO languages (id, user_id, name) VALUES ($1, $2, $3) \
             RETURNING id, user_id, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(owner)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::DuplicateName(format!("Language '{name}'"))
            } else {
                unexpected(e)
            }
        })?;
        Ok(record.to_domain())
    }

    async fn rename_language(
        &self,
        owner: Uuid,
        language_id: Uuid,
        name: &str,
    ) -> PortResult<Language> {
        let record = sqlx::query_as::<_, LanguageRecord>(
            "UPDATE languages SET name = $3 WHERE id = $1 AND user_id = $2 \
             RETURNING id, user_id, name, created_at",
        )
        .bind(language_id)
        .bind(owner)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                PortError::DuplicateName(format!("Language '{name}'"))
            } else {
                unexpected(e)
            }
        })?
        .ok_or_else(|| PortError::NotFound(format!("Language {language_id}")))?;
        Ok(record.to_domain())
    }

    async fn delete_language(&self, owner: Uuid, language_id: Uuid) -> PortResult<()> {
        // Sessions go with it through ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM languages WHERE id = $1 AND user_id = $2")
            .bind(language_id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Language {language_id}")));
        }
        Ok(())
    }

    async fn list_sessions(
        &self,
        owner: Uuid,
        language_id: Option<Uuid>,
    ) -> PortResult<Vec<SessionWithLanguage>> {
        if let Some(language_id) = language_id {
            self.get_language(owner, language_id).await?;
        }

        let sql = format!(
            "SELECT {SESSION_COLUMNS}, l.name AS language_name \
             FROM study_sessions s \
             JOIN languages l ON s.language_id = l.id \
             WHERE s.user_id = $1 AND ($2::UUID IS NULL OR s.language_id = $2) \
             ORDER BY s.date DESC, s.created_at DESC"
        );
        let records = sqlx::query_as::<_, SessionWithLanguageRecord>(&sql)
            .bind(owner)
            .bind(language_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;

        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn create_session(
        &self,
        owner: Uuid,
        session: &NewStudySession,
    ) -> PortResult<StudySession> {
        // The SELECT only yields a row when the language belongs to the caller,
        // so a foreign language id inserts nothing.
        let sql = format!(
            "INSERT INTO study_sessions AS s \
                 (id, user_id, language_id, category, duration_minutes, date, notes) \
             SELECT $1, l.user_id, l.id, $4, $5, $6, $7 \
             FROM languages l WHERE l.id = $3 AND l.user_id = $2 \
             RETURNING {SESSION_COLUMNS}"
        );
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(owner)
            .bind(session.language_id)
            .bind(session.category.as_str())
            .bind(session.duration_minutes)
            .bind(session.date)
            .bind(session.notes.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Language {}", session.language_id)))?;

        record.to_domain()
    }

    async fn update_session(
        &self,
        owner: Uuid,
        session_id: Uuid,
        changes: &SessionChanges,
    ) -> PortResult<StudySession> {
        let sql = format!(
            "UPDATE study_sessions AS s \
             SET category = $3, duration_minutes = $4, date = $5, notes = $6 \
             WHERE s.id = $1 AND s.user_id = $2 \
             RETURNING {SESSION_COLUMNS}"
        );
        let record = sqlx::query_as::<_, SessionRecord>(&sql)
            .bind(session_id)
            .bind(owner)
            .bind(changes.category.as_str())
            .bind(changes.duration_minutes)
            .bind(changes.date)
            .bind(changes.notes.as_deref())
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .ok_or_else(|| PortError::NotFound(format!("Session {session_id}")))?;

        record.to_domain()
    }

    async fn delete_session(&self, owner: Uuid, session_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM study_sessions WHERE id = $1 AND user_id = $2")
            .bind(session_id)
            .bind(owner)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;

        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Session {session_id}")));
        }
        Ok(())
    }

    async fn language_stats(&self, owner: Uuid, language_id: Uuid) -> PortResult<LanguageStats> {
        self.get_language(owner, language_id).await?;

        let records = sqlx::query_as::<_, CategoryRecord>(
            "SELECT category, \
                    SUM(duration_minutes)::BIGINT AS total_minutes, \
                    COUNT(*) AS session_count \
             FROM study_sessions \
             WHERE language_id = $1 AND user_id = $2 \
             GROUP BY category \
             ORDER BY total_minutes DESC, category ASC",
        )
        .bind(language_id)
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        let by_category = records
            .into_iter()
            .map(|r| r.to_domain())
            .collect::<PortResult<Vec<_>>>()?;

        Ok(LanguageStats {
            total_minutes: by_category.iter().map(|c| c.total_minutes).sum(),
            by_category,
        })
    }

    async fn overall_stats(&self, owner: Uuid) -> PortResult<OverallStats> {
        let total_minutes = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(duration_minutes), 0)::BIGINT FROM study_sessions WHERE user_id = $1",
        )
        .bind(owner)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;

        let top_language = sqlx::query_as::<_, TopLanguageRecord>(
            "SELECT l.name, SUM(s.duration_minutes)::BIGINT AS total_minutes \
             FROM study_sessions s \
             JOIN languages l ON l.id = s.language_id \
             WHERE s.user_id = $1 \
             GROUP BY l.id, l.name \
             ORDER BY total_minutes DESC, l.name ASC \
             LIMIT 1",
        )
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .map_err(unexpected)?
        .map(|r| TopLanguage {
            name: r.name,
            total_minutes: r.total_minutes,
        });

        Ok(OverallStats {
            total_minutes,
            top_language,
        })
    }

    async fn daily_activity(&self, owner: Uuid) -> PortResult<Vec<DailyActivity>> {
        let records = sqlx::query_as::<_, DailyActivityRecord>(
            "SELECT date, \
                    SUM(duration_minutes)::BIGINT AS total_minutes, \
                    COUNT(*) AS session_count \
             FROM study_sessions \
             WHERE user_id = $1 \
             GROUP BY date \
             ORDER BY date ASC",
        )
        .bind(owner)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;

        Ok(records
            .into_iter()
            .map(|r| DailyActivity {
                date: r.date,
                total_minutes: r.total_minutes,
                session_count: r.session_count,
            })
            .collect())
    }
}
