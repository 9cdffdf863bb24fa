//! HTTP error mapping.
//!
//! Every handler returns `Result<_, AppError>`. Messages for 4xx responses
//! come from the access layer and are safe to return verbatim; dependency
//! failures are logged in full and reported generically.

use axum::{
    Json,
    extract::multipart::MultipartError,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use super::types::ErrorResponse;
use crate::error::Error;

const INTERNAL: &str = "internal server error";

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized,
    NotFound(String),
    Conflict(String),
    PayloadTooLarge(String),
    Internal(String),
}

impl AppError {
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            Self::Unauthorized => "unauthorized".to_string(),
            Self::BadRequest(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::PayloadTooLarge(m)
            | Self::Internal(m) => m,
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(m) => Self::BadRequest(m),
            Error::Unauthorized(_) => Self::Unauthorized,
            Error::NotFound(m) => Self::NotFound(m),
            Error::Conflict(m) => Self::Conflict(m),
            Error::Dependency(e) => {
                error!(error = %format!("{e:#}"), "Dependency failure");
                Self::Internal(INTERNAL.to_string())
            },
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        match err.status() {
            StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge(err.body_text()),
            status if status.is_client_error() => Self::BadRequest(err.body_text()),
            _ => {
                error!(error = %err, "Multipart stream failed");
                Self::Internal(INTERNAL.to_string())
            },
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection.status() {
            StatusCode::PAYLOAD_TOO_LARGE => Self::PayloadTooLarge(rejection.body_text()),
            _ => Self::BadRequest(rejection.body_text()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthFailure;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::validation("bad"), StatusCode::BAD_REQUEST),
            (AuthFailure::InvalidToken.into(), StatusCode::UNAUTHORIZED),
            (Error::not_found("gone"), StatusCode::NOT_FOUND),
            (Error::conflict("again"), StatusCode::CONFLICT),
            (anyhow::anyhow!("disk").into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_dependency_detail_hidden() {
        let err = AppError::from(Error::from(anyhow::anyhow!("mongo at 10.0.0.3 down")));
        assert!(matches!(err, AppError::Internal(ref m) if m == "internal server error"));
    }
}
