//! crates/study_tracker_core/src/testing.rs
//!
//! An in-memory `DatabaseService` for tests.
//!
//! It mirrors the Postgres adapter's observable behavior: uniqueness of
//! usernames, emails and per-owner language names, owner scoping, cascade
//! deletes and the ordering of every listing.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

use crate::domain::{
    Category, CategoryBreakdown, DailyActivity, Identity, Language, LanguageStats,
    LanguageSummary, NewStudySession, NewUser, OverallStats, SessionChanges,
    SessionWithLanguage, StudySession, TopLanguage, User, UserCredentials,
};
use crate::ports::{DatabaseService, PortError, PortResult};

#[derive(Default)]
struct Store {
    users: Vec<UserCredentials>,
    languages: Vec<Language>,
    sessions: Vec<StudySession>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl Store {
    /// Strictly increasing timestamps so "newest first" orderings are stable.
    fn tick(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let next = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(next);
        next
    }

    fn owned_language(&self, owner: Uuid, language_id: Uuid) -> PortResult<&Language> {
        self.languages
            .iter()
            .find(|l| l.id == language_id && l.user_id == owner)
            .ok_or_else(|| PortError::NotFound(format!("Language {language_id}")))
    }

    fn minutes_for(&self, language_id: Uuid) -> i64 {
        self.sessions
            .iter()
            .filter(|s| s.language_id == language_id)
            .map(|s| i64::from(s.duration_minutes))
            .sum()
    }

    fn with_language_name(&self, session: &StudySession) -> SessionWithLanguage {
        let language_name = self
            .languages
            .iter()
            .find(|l| l.id == session.language_id)
            .map(|l| l.name.clone())
            .unwrap_or_default();
        SessionWithLanguage {
            session: session.clone(),
            language_name,
        }
    }
}

#[derive(Default)]
pub struct InMemoryDatabase {
    store: Mutex<Store>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_count(&self) -> usize {
        self.store().users.len()
    }

    pub fn session_count(&self) -> usize {
        self.store().sessions.len()
    }

    /// The identity a token for `user_id` would carry, if the user exists.
    pub fn identity_of(&self, user_id: Uuid) -> Option<Identity> {
        self.store()
            .users
            .iter()
            .find(|c| c.user.id == user_id)
            .map(|c| Identity::from(&c.user))
    }

    /// Removes a user together with everything they own.
    pub fn delete_user(&self, user_id: Uuid) {
        let mut store = self.store();
        store.users.retain(|c| c.user.id != user_id);
        store.languages.retain(|l| l.user_id != user_id);
        store.sessions.retain(|s| s.user_id != user_id);
    }

    fn store(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl DatabaseService for InMemoryDatabase {
    async fn create_user(&self, new_user: &NewUser) -> PortResult<User> {
        let mut store = self.store();
        if store
            .users
            .iter()
            .any(|c| c.user.username == new_user.username || c.user.email == new_user.email)
        {
            return Err(PortError::DuplicateIdentity);
        }

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username.clone(),
            email: new_user.email.clone(),
            created_at: store.tick(),
        };
        store.users.push(UserCredentials {
            user: user.clone(),
            password_hash: new_user.password_hash.clone(),
        });
        Ok(user)
    }

    async fn find_user_by_identifier(&self, identifier: &str) -> PortResult<UserCredentials> {
        let store = self.store();
        store
            .users
            .iter()
            .find(|c| c.user.email == identifier)
            .or_else(|| store.users.iter().find(|c| c.user.username == identifier))
            .cloned()
            .ok_or_else(|| PortError::NotFound("User".to_string()))
    }

    async fn get_user(&self, user_id: Uuid) -> PortResult<User> {
        self.store()
            .users
            .iter()
            .find(|c| c.user.id == user_id)
            .map(|c| c.user.clone())
            .ok_or_else(|| PortError::NotFound(format!("User {user_id}")))
    }

    async fn list_languages(&self, owner: Uuid) -> PortResult<Vec<LanguageSummary>> {
        let store = self.store();
        let mut summaries: Vec<LanguageSummary> = store
            .languages
            .iter()
            .filter(|l| l.user_id == owner)
            .map(|l| LanguageSummary {
                language: l.clone(),
                total_minutes: store.minutes_for(l.id),
            })
            .collect();
        summaries.sort_by(|a, b| {
            b.total_minutes
                .cmp(&a.total_minutes)
                .then(b.language.created_at.cmp(&a.language.created_at))
        });
        Ok(summaries)
    }

    async fn get_language(&self, owner: Uuid, language_id: Uuid) -> PortResult<Language> {
        self.store().owned_language(owner, language_id).cloned()
    }

    async fn create_language(&self, owner: Uuid, name: &str) -> PortResult<Language> {
        let mut store = self.store();
        if store
            .languages
            .iter()
            .any(|l| l.user_id == owner && l.name == name)
        {
            return Err(PortError::DuplicateName(format!("Language '{name}'")));
        }

        let language = Language {
            id: Uuid::new_v4(),
            user_id: owner,
            name: name.to_string(),
            created_at: store.tick(),
        };
        store.languages.push(language.clone());
        Ok(language)
    }

    async fn rename_language(
        &self,
        owner: Uuid,
        language_id: Uuid,
        name: &str,
    ) -> PortResult<Language> {
        let mut store = self.store();
        store.owned_language(owner, language_id)?;
        if store
            .languages
            .iter()
            .any(|l| l.user_id == owner && l.name == name && l.id != language_id)
        {
            return Err(PortError::DuplicateName(format!("Language '{name}'")));
        }

        let language = store
            .languages
            .iter_mut()
            .find(|l| l.id == language_id)
            .ok_or_else(|| PortError::NotFound(format!("Language {language_id}")))?;
        language.name = name.to_string();
        Ok(language.clone())
    }

    async fn delete_language(&self, owner: Uuid, language_id: Uuid) -> PortResult<()> {
        let mut store = self.store();
        store.owned_language(owner, language_id)?;
        store.languages.retain(|l| l.id != language_id);
        store.sessions.retain(|s| s.language_id != language_id);
        Ok(())
    }

    async fn list_sessions(
        &self,
        owner: Uuid,
        language_id: Option<Uuid>,
    ) -> PortResult<Vec<SessionWithLanguage>> {
        let store = self.store();
        if let Some(language_id) = language_id {
            store.owned_language(owner, language_id)?;
        }

        let mut sessions: Vec<SessionWithLanguage> = store
            .sessions
            .iter()
            .filter(|s| s.user_id == owner)
            .filter(|s| language_id.map_or(true, |id| s.language_id == id))
            .map(|s| store.with_language_name(s))
            .collect();
        sessions.sort_by(|a, b| {
            b.session
                .date
                .cmp(&a.session.date)
                .then(b.session.created_at.cmp(&a.session.created_at))
        });
        Ok(sessions)
    }

    async fn create_session(
        &self,
        owner: Uuid,
        session: &NewStudySession,
    ) -> PortResult<StudySession> {
        let mut store = self.store();
        store.owned_language(owner, session.language_id)?;

        let created = StudySession {
            id: Uuid::new_v4(),
            user_id: owner,
            language_id: session.language_id,
            category: session.category,
            duration_minutes: session.duration_minutes,
            date: session.date,
            notes: session.notes.clone(),
            created_at: store.tick(),
        };
        store.sessions.push(created.clone());
        Ok(created)
    }

    async fn update_session(
        &self,
        owner: Uuid,
        session_id: Uuid,
        changes: &SessionChanges,
    ) -> PortResult<StudySession> {
        let mut store = self.store();
        let session = store
            .sessions
            .iter_mut()
            .find(|s| s.id == session_id && s.user_id == owner)
            .ok_or_else(|| PortError::NotFound(format!("Session {session_id}")))?;

        session.category = changes.category;
        session.duration_minutes = changes.duration_minutes;
        session.date = changes.date;
        session.notes = changes.notes.clone();
        Ok(session.clone())
    }

    async fn delete_session(&self, owner: Uuid, session_id: Uuid) -> PortResult<()> {
        let mut store = self.store();
        let before = store.sessions.len();
        store
            .sessions
            .retain(|s| !(s.id == session_id && s.user_id == owner));
        if store.sessions.len() == before {
            return Err(PortError::NotFound(format!("Session {session_id}")));
        }
        Ok(())
    }

    async fn language_stats(&self, owner: Uuid, language_id: Uuid) -> PortResult<LanguageStats> {
        let store = self.store();
        store.owned_language(owner, language_id)?;

        let mut per_category: BTreeMap<Category, (i64, i64)> = BTreeMap::new();
        for s in store
            .sessions
            .iter()
            .filter(|s| s.language_id == language_id && s.user_id == owner)
        {
            let entry = per_category.entry(s.category).or_default();
            entry.0 += i64::from(s.duration_minutes);
            entry.1 += 1;
        }

        let mut by_category: Vec<CategoryBreakdown> = per_category
            .into_iter()
            .map(|(category, (total_minutes, session_count))| CategoryBreakdown {
                category,
                total_minutes,
                session_count,
            })
            .collect();
        by_category.sort_by(|a, b| {
            b.total_minutes
                .cmp(&a.total_minutes)
                .then_with(|| a.category.as_str().cmp(b.category.as_str()))
        });

        Ok(LanguageStats {
            total_minutes: by_category.iter().map(|c| c.total_minutes).sum(),
            by_category,
        })
    }

    async fn overall_stats(&self, owner: Uuid) -> PortResult<OverallStats> {
        let store = self.store();
        let owned: Vec<&StudySession> =
            store.sessions.iter().filter(|s| s.user_id == owner).collect();

        let mut per_language: BTreeMap<Uuid, i64> = BTreeMap::new();
        for s in &owned {
            *per_language.entry(s.language_id).or_default() += i64::from(s.duration_minutes);
        }

        let top_language = per_language
            .into_iter()
            .filter_map(|(id, minutes)| {
                store
                    .languages
                    .iter()
                    .find(|l| l.id == id)
                    .map(|l| TopLanguage {
                        name: l.name.clone(),
                        total_minutes: minutes,
                    })
            })
            .min_by(|a, b| {
                b.total_minutes
                    .cmp(&a.total_minutes)
                    .then_with(|| a.name.cmp(&b.name))
            });

        Ok(OverallStats {
            total_minutes: owned.iter().map(|s| i64::from(s.duration_minutes)).sum(),
            top_language,
        })
    }

    async fn daily_activity(&self, owner: Uuid) -> PortResult<Vec<DailyActivity>> {
        let store = self.store();
        let mut per_day: BTreeMap<chrono::NaiveDate, (i64, i64)> = BTreeMap::new();
        for s in store.sessions.iter().filter(|s| s.user_id == owner) {
            let entry = per_day.entry(s.date).or_default();
            entry.0 += i64::from(s.duration_minutes);
            entry.1 += 1;
        }

        Ok(per_day
            .into_iter()
            .map(|(date, (total_minutes, session_count))| DailyActivity {
                date,
                total_minutes,
                session_count,
            })
            .collect())
    }
}
