//! Maps auth and application errors to HTTP responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use tokenguard_auth::AuthError;
use tokenguard_core::error::{AppError, ErrorKind};

/// Standard API error response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiErrorResponse {
    /// Machine-readable error code.
    pub error: String,
    /// Human-readable message.
    pub message: String,
}

/// Error returned by handlers, extractors and middleware.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    App(#[from] AppError),

    #[error("{0}")]
    BadRequest(String),
}

impl ApiError {
    /// HTTP status and machine-readable code for this error.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Auth(AuthError::App(inner)) | Self::App(inner) => app_status(inner),
            Self::Auth(err) => (
                StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::UNAUTHORIZED),
                err.error_code(),
            ),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        }
    }
}

fn app_status(err: &AppError) -> (StatusCode, &'static str) {
    match err.kind {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        ErrorKind::Authentication => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
        ErrorKind::Authorization => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
        ErrorKind::ServiceUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE"),
        ErrorKind::Cache
        | ErrorKind::Configuration
        | ErrorKind::Serialization
        | ErrorKind::Internal => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status();

        // Infrastructure details stay in the logs.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self, "Internal server error");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let body = ApiErrorResponse {
            error: error_code.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_keep_their_status() {
        let expired = tokenguard_auth::Token::new("admin");
        let cases = [
            (ApiError::from(AuthError::AuthRequired), StatusCode::UNAUTHORIZED),
            (
                ApiError::from(AuthError::TokenExpired(Box::new(expired))),
                StatusCode::PAYMENT_REQUIRED,
            ),
            (
                ApiError::from(AuthError::Forbidden("missing".into())),
                StatusCode::FORBIDDEN,
            ),
            (ApiError::BadRequest("nope".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, expected) in cases {
            assert_eq!(err.status().0, expected, "{err}");
        }
    }

    #[test]
    fn test_wrapped_app_errors_map_by_kind() {
        let err = ApiError::from(AuthError::App(AppError::not_found("Unknown scene 'x'")));
        assert_eq!(err.status(), (StatusCode::NOT_FOUND, "NOT_FOUND"));

        let err = ApiError::from(AppError::cache("redis down"));
        assert_eq!(err.status().0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
