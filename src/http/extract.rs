//! Caller identity extractors.
//!
//! The credential is read from the session cookie, falling back to an
//! `Authorization: Bearer` header.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use super::{AppError, AppState, metrics};
use crate::audit::{AuditEvent, log_audit_event};
use crate::error::Error;
use crate::model::RecordId;

/// A caller with a valid session. Rejects with 401 otherwise.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated(pub RecordId);

/// A caller who may be anonymous. Never rejects.
#[derive(Debug, Clone, Copy)]
pub struct Visitor(pub Option<RecordId>);

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credential = credential(&parts.headers, &state.cookie_name);
        match state.identity.resolve_strict(credential.as_deref()).await {
            Ok(id) => Ok(Self(id)),
            Err(Error::Unauthorized(failure)) => {
                metrics::record_auth_failure("strict");
                log_audit_event(AuditEvent::AuthFailure {
                    path: parts.uri.path().to_string(),
                    reason: failure.as_str().to_string(),
                });
                Err(AppError::Unauthorized)
            },
            Err(e) => Err(e.into()),
        }
    }
}

impl FromRequestParts<AppState> for Visitor {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let credential = credential(&parts.headers, &state.cookie_name);
        let caller = state.identity.resolve_permissive(credential.as_deref()).await;
        if credential.is_some() && caller.is_none() {
            metrics::record_auth_failure("permissive");
        }
        Ok(Self(caller))
    }
}

/// Reads the session credential from the request headers.
pub(crate) fn credential(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.trim().to_string());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_cookie_preferred_over_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark; token=abc"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(credential(&headers, "token").as_deref(), Some("abc"));
    }

    #[test]
    fn test_bearer_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("other=1"));
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(credential(&headers, "token").as_deref(), Some("xyz"));
    }

    #[test]
    fn test_custom_cookie_name_and_absence() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("session=s3"));
        assert_eq!(credential(&headers, "session").as_deref(), Some("s3"));
        assert_eq!(credential(&headers, "token"), None);
        assert_eq!(credential(&HeaderMap::new(), "token"), None);
    }
}
