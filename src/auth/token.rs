//! Session token contract and the HS512 JWT codec.

use std::fmt;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::model::User;

/// Claims carried by a session token.
///
/// Only `id` and `exp` are trusted for authorization; the profile fields are
/// informational.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User identifier.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "loginTime", default, skip_serializing_if = "Option::is_none")]
    pub login_time: Option<DateTime<Utc>>,
    /// Expiry as Unix seconds.
    pub exp: i64,
}

/// Verifies a bearer credential and returns its claims.
///
/// Implemented by [`JwtCodec`]; tests and alternative deployments may plug in
/// their own verifier.
pub trait TokenVerifier: Send + Sync + 'static {
    /// # Errors
    ///
    /// Returns an error if the token is malformed, badly signed or expired.
    fn verify(&self, token: &str) -> Result<Claims>;
}

/// HS512 JWT issuer and verifier.
#[derive(Clone)]
pub struct JwtCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtCodec")
            .field("ttl", &self.ttl)
            .finish_non_exhaustive()
    }
}

impl JwtCodec {
    /// Creates a codec with a shared secret and a token lifetime.
    pub fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS512);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    /// Token lifetime.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issues a session token for `user`, returning it with its expiry.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn issue(&self, user: &User) -> Result<(String, DateTime<Utc>)> {
        let now = Utc::now();
        let expires = now + self.ttl;
        let claims = Claims {
            id: user.id.to_string(),
            email: Some(user.email.clone()),
            name: Some(user.name.clone()),
            login_time: Some(now),
            exp: expires.timestamp(),
        };
        let token = self.sign(&claims)?;
        Ok((token, expires))
    }

    /// Signs arbitrary claims.
    ///
    /// # Errors
    ///
    /// Returns an error if signing fails.
    pub fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS512), claims, &self.encoding)
            .context("Failed to sign session token")
    }
}

impl TokenVerifier for JwtCodec {
    fn verify(&self, token: &str) -> Result<Claims> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .context("Session token rejected")?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordId;

    fn user() -> User {
        User {
            id: RecordId::generate(),
            name: "Alice".to_string(),
            handle: "alice".to_string(),
            email: "alice@example.com".to_string(),
            password_hash: None,
        }
    }

    fn codec(secret: &str) -> JwtCodec {
        JwtCodec::new(secret.as_bytes(), Duration::hours(1))
    }

    #[test]
    fn test_issue_then_verify() {
        let codec = codec("secret");
        let user = user();
        let (token, expires) = codec.issue(&user).unwrap();

        let claims = codec.verify(&token).unwrap();
        assert_eq!(claims.id, user.id.to_string());
        assert_eq!(claims.email.as_deref(), Some("alice@example.com"));
        assert_eq!(claims.exp, expires.timestamp());
        assert!(claims.login_time.is_some());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let (token, _) = codec("secret").issue(&user()).unwrap();
        assert!(codec("other").verify(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let codec = codec("secret");
        let claims = Claims {
            id: RecordId::generate().to_string(),
            email: None,
            name: None,
            login_time: None,
            exp: (Utc::now() - Duration::minutes(5)).timestamp(),
        };
        let token = codec.sign(&claims).unwrap();
        assert!(codec.verify(&token).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(codec("secret").verify("not.a.token").is_err());
        assert!(codec("secret").verify("").is_err());
    }

    #[test]
    fn test_other_algorithm_rejected() {
        let claims = Claims {
            id: RecordId::generate().to_string(),
            email: None,
            name: None,
            login_time: None,
            exp: (Utc::now() + Duration::hours(1)).timestamp(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"secret"),
        )
        .unwrap();
        assert!(codec("secret").verify(&token).is_err());
    }
}
