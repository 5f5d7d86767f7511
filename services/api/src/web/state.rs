//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use study_tracker_core::accounts::Accounts;
use study_tracker_core::ports::{DatabaseService, PasswordService, TokenService};
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Storage is injected as a trait object, so tests can swap the Postgres
/// adapter for an in-memory one.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub accounts: Accounts,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        db: Arc<dyn DatabaseService>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            accounts: Accounts::new(db.clone(), passwords, tokens),
            db,
            config,
        }
    }
}
