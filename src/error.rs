//! Error taxonomy shared by the access layer and the HTTP surface.
//!
//! Adapter layers (`store`, `blob`, `config`) return [`anyhow::Result`] with
//! context attached. The access layer converts those into
//! [`Error::Dependency`], keeping the detail for logs and out of responses.

use crate::auth::AuthFailure;

/// Result type for access-layer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced to callers of the access layer.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed input. The message is safe to return verbatim.
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or revoked credential.
    #[error("unauthorized: {0}")]
    Unauthorized(#[from] AuthFailure),

    /// Nothing matched, including "exists but not yours to see".
    #[error("{0}")]
    NotFound(String),

    /// Redundant set mutation (already liked / already unliked).
    #[error("{0}")]
    Conflict(String),

    /// Record store or blob store failure.
    #[error("dependency failure: {0:#}")]
    Dependency(#[from] anyhow::Error),
}

impl Error {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a conflict error.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict(message.into())
    }

    /// Returns true for failures caused by the stores rather than the caller.
    #[must_use]
    pub fn is_dependency(&self) -> bool {
        matches!(self, Self::Dependency(_))
    }
}
