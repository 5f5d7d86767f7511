//! services/api/src/adapters/token.rs
//!
//! HS256 JWT implementation of the `TokenService` port.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use study_tracker_core::domain::{Identity, IssuedToken};
use study_tracker_core::ports::{PortError, PortResult, TokenService};
use uuid::Uuid;

/// JWT claims embedded in every session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject -- the user's id.
    pub sub: Uuid,
    pub username: String,
    pub email: String,
    /// Issued-at time (UTC Unix timestamp).
    pub iat: i64,
    /// Expiration time (UTC Unix timestamp).
    pub exp: i64,
}

pub struct JwtTokenAdapter {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl JwtTokenAdapter {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    fn sign(&self, claims: &Claims) -> PortResult<String> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| PortError::Unexpected(format!("Failed to sign token: {e}")))
    }
}

impl TokenService for JwtTokenAdapter {
    fn issue(&self, identity: &Identity) -> PortResult<IssuedToken> {
        let now = Utc::now();
        let expires_at = now + self.ttl;
        let claims = Claims {
            sub: identity.user_id,
            username: identity.username.clone(),
            email: identity.email.clone(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        Ok(IssuedToken {
            token: self.sign(&claims)?,
            expires_at,
        })
    }

    fn verify(&self, token: &str) -> PortResult<Identity> {
        // HS256 with `exp` validation (60s leeway).
        let data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|e| PortError::Unauthenticated(format!("{:?}", e.kind())))?;

        Ok(Identity {
            user_id: data.claims.sub,
            username: data.claims.username,
            email: data.claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

    fn identity() -> Identity {
        Identity {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
        }
    }

    #[test]
    fn issued_token_verifies_to_the_same_identity() {
        let tokens = JwtTokenAdapter::new(SECRET, Duration::days(7));
        let who = identity();
        let issued = tokens.issue(&who).expect("token generation should succeed");

        assert_eq!(tokens.verify(&issued.token).expect("token should verify"), who);
        let ttl = issued.expires_at - Utc::now();
        assert!(ttl > Duration::days(6) && ttl <= Duration::days(7));
    }

    #[test]
    fn expired_token_fails() {
        let tokens = JwtTokenAdapter::new(SECRET, Duration::days(7));
        let who = identity();
        let now = Utc::now().timestamp();
        // Well past the default 60-second leeway.
        let token = tokens
            .sign(&Claims {
                sub: who.user_id,
                username: who.username,
                email: who.email,
                iat: now - 600,
                exp: now - 300,
            })
            .unwrap();

        let err = tokens.verify(&token).unwrap_err();
        assert!(matches!(err, PortError::Unauthenticated(_)));
    }

    #[test]
    fn token_from_another_secret_fails() {
        let ours = JwtTokenAdapter::new(SECRET, Duration::days(7));
        let theirs = JwtTokenAdapter::new("a-completely-different-secret-value", Duration::days(7));
        let token = theirs.issue(&identity()).unwrap().token;

        assert!(matches!(
            ours.verify(&token),
            Err(PortError::Unauthenticated(_))
        ));
    }

    #[test]
    fn garbage_is_unauthenticated() {
        let tokens = JwtTokenAdapter::new(SECRET, Duration::days(7));
        assert!(matches!(
            tokens.verify("not.a.jwt"),
            Err(PortError::Unauthenticated(_))
        ));
    }
}
