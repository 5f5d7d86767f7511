//! services/api/src/adapters/password.rs
//!
//! Argon2id implementation of the `PasswordService` port. Hashes are stored in
//! PHC string format, so the salt and work factors travel with each hash and
//! old hashes keep verifying after the configured costs change.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use study_tracker_core::ports::{PasswordService, PortError, PortResult};

use crate::config::PasswordHashConfig;

pub struct Argon2PasswordAdapter {
    argon2: Argon2<'static>,
}

impl Argon2PasswordAdapter {
    /// Builds a hasher with the given memory (KiB) and iteration costs.
    pub fn new(config: &PasswordHashConfig) -> PortResult<Self> {
        let params = Params::new(config.memory_kib, config.iterations, 1, None)
            .map_err(|e| PortError::Unexpected(format!("Invalid Argon2 parameters: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl PasswordService for Argon2PasswordAdapter {
    fn hash(&self, password: &str) -> PortResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PortError::Unexpected(format!("Failed to hash password: {e}")))
    }

    fn verify(&self, password: &str, hash: &str) -> PortResult<bool> {
        let parsed_hash = PasswordHash::new(hash)
            .map_err(|e| PortError::Unexpected(format!("Failed to parse password hash: {e}")))?;
        match self.argon2.verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(PortError::Unexpected(format!("Failed to verify password: {e}"))),
        }
    }
}
