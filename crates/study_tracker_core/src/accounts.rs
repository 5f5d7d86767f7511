//! crates/study_tracker_core/src/accounts.rs
//!
//! Registration, login and token verification, written against the ports so
//! the same flow runs over Postgres in production and in-memory in tests.

use std::sync::Arc;

use crate::domain::{Identity, IssuedToken, NewUser, User};
use crate::ports::{DatabaseService, PasswordService, PortError, PortResult, TokenService};
use crate::validation::{validate_login, validate_registration, RegistrationDraft};

/// A freshly issued token and the public projection of its user.
#[derive(Debug, Clone)]
pub struct AuthOutcome {
    pub token: IssuedToken,
    pub user: User,
}

#[derive(Clone)]
pub struct Accounts {
    db: Arc<dyn DatabaseService>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
}

impl Accounts {
    pub fn new(
        db: Arc<dyn DatabaseService>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            db,
            passwords,
            tokens,
        }
    }

    /// Creates the account and signs the new user in.
    ///
    /// A taken username or email surfaces as `DuplicateIdentity` from the
    /// storage layer; nothing is written in that case.
    pub async fn register(&self, draft: &RegistrationDraft) -> PortResult<AuthOutcome> {
        let registration = validate_registration(draft)?;
        let password_hash = self.passwords.hash(&registration.password)?;

        let user = self
            .db
            .create_user(&NewUser {
                username: registration.username,
                email: registration.email,
                password_hash,
            })
            .await?;

        let token = self.tokens.issue(&Identity::from(&user))?;
        Ok(AuthOutcome { token, user })
    }

    /// Signs in with an email or a username.
    ///
    /// An unknown identifier and a wrong password both produce
    /// `InvalidCredentials`, so callers cannot probe which accounts exist.
    pub async fn login(
        &self,
        identifier: Option<&str>,
        password: Option<&str>,
    ) -> PortResult<AuthOutcome> {
        let attempt = validate_login(identifier, password)?;

        let credentials = match self.db.find_user_by_identifier(&attempt.identifier).await {
            Ok(credentials) => credentials,
            Err(PortError::NotFound(_)) => return Err(PortError::InvalidCredentials),
            Err(e) => return Err(e),
        };

        if !self
            .passwords
            .verify(&attempt.password, &credentials.password_hash)?
        {
            return Err(PortError::InvalidCredentials);
        }

        let token = self.tokens.issue(&Identity::from(&credentials.user))?;
        Ok(AuthOutcome {
            token,
            user: credentials.user,
        })
    }

    pub fn verify_token(&self, token: &str) -> PortResult<Identity> {
        self.tokens.verify(token)
    }

    /// Re-reads the caller's account from storage.
    pub async fn current_user(&self, identity: &Identity) -> PortResult<User> {
        self.db.get_user(identity.user_id).await
    }
}
