//! Caller identity resolution.
//!
//! Every request is resolved to at most one user identifier from its session
//! token. Two modes exist:
//!
//! - **strict** (writes): any failure is [`Error::Unauthorized`], and a store
//!   failure while checking the subject still exists is
//!   [`Error::Dependency`].
//! - **permissive** (reads): any failure degrades to an anonymous visitor.
//!
//! The resolver is constructed once and shared; it never reaches for global
//! state.

mod token;

pub use token::{Claims, JwtCodec, TokenVerifier};

use std::sync::Arc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{RecordId, User, fields};
use crate::store::{Filter, RecordStore};

/// Why a credential was rejected. Never shown to the caller in detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    #[error("missing credential")]
    MissingCredential,
    #[error("invalid token")]
    InvalidToken,
    #[error("token subject is not a user id")]
    InvalidSubject,
    #[error("token subject no longer exists")]
    UnknownUser,
}

impl AuthFailure {
    /// Label used in logs and metrics.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidToken => "invalid_token",
            Self::InvalidSubject => "invalid_subject",
            Self::UnknownUser => "unknown_user",
        }
    }
}

/// Resolves credentials to user identifiers.
#[derive(Clone)]
pub struct IdentityResolver {
    verifier: Arc<dyn TokenVerifier>,
    records: RecordStore,
}

impl IdentityResolver {
    pub fn new(verifier: impl TokenVerifier, records: RecordStore) -> Self {
        Self {
            verifier: Arc::new(verifier),
            records,
        }
    }

    /// Resolves a credential or fails.
    ///
    /// # Errors
    ///
    /// - [`Error::Unauthorized`] if the credential is missing, malformed,
    ///   expired, carries a non-identifier subject, or names a deleted user
    /// - [`Error::Dependency`] if the user lookup fails
    pub async fn resolve_strict(&self, credential: Option<&str>) -> Result<RecordId> {
        let token = credential
            .filter(|t| !t.is_empty())
            .ok_or(AuthFailure::MissingCredential)?;

        let claims = self.verifier.verify(token).map_err(|e| {
            debug!(error = %format!("{e:#}"), "Token verification failed");
            AuthFailure::InvalidToken
        })?;

        let id: RecordId = claims
            .id
            .parse()
            .map_err(|_| AuthFailure::InvalidSubject)?;

        let exists = self
            .records
            .count::<User>(&Filter::eq(fields::ID, id))
            .await
            .map_err(Error::Dependency)?;
        if exists == 0 {
            return Err(AuthFailure::UnknownUser.into());
        }

        Ok(id)
    }

    /// Resolves a credential, treating every failure as anonymous.
    pub async fn resolve_permissive(&self, credential: Option<&str>) -> Option<RecordId> {
        match self.resolve_strict(credential).await {
            Ok(id) => Some(id),
            Err(Error::Unauthorized(AuthFailure::MissingCredential)) => None,
            Err(e) => {
                debug!(error = %e, "Treating caller as anonymous");
                None
            },
        }
    }
}
