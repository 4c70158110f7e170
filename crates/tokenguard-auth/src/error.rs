//! Error taxonomy of the token lifecycle.
//!
//! Every failure a caller can observe while validating, refreshing or
//! authorizing is a distinct variant. Infrastructure failures (cache,
//! configuration, serialization) are wrapped as [`AuthError::App`].

use thiserror::Error;

use tokenguard_core::error::{AppError, ErrorKind};

use crate::token::Token;

/// Result alias for token lifecycle operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors raised by the session engine and the authorization evaluator.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No token was presented with the request.
    #[error("Authentication required")]
    AuthRequired,

    /// The token is malformed, names an unknown scene or algorithm, or was
    /// issued for another scene.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The signature does not match the token content.
    #[error("Token signature verification failed")]
    InvalidSignature,

    /// The token id is blacklisted or its session was evicted.
    #[error("Token has been revoked")]
    Blacklisted,

    /// Single-device scene and the token was minted for another device.
    #[error("Token was issued for a different environment")]
    EnvironmentMismatch,

    /// The token expired. It may still be refreshable; the parsed token is
    /// carried so the caller can attempt a refresh without parsing again.
    #[error("Token has expired")]
    TokenExpired(Box<Token>),

    /// The refresh window of the token has elapsed.
    #[error("Token can no longer be refreshed")]
    RefreshWindowElapsed,

    /// Another request held the refresh lock for longer than the retry budget.
    #[error("Timed out waiting for a concurrent token refresh")]
    RefreshLockTimeout,

    /// The identity does not hold the required codes.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Cache, configuration or serialization failure.
    #[error(transparent)]
    App(#[from] AppError),
}

impl AuthError {
    /// HTTP status code associated with this error.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::TokenExpired(_) => 402,
            Self::Forbidden(_) => 403,
            Self::App(_) => 500,
            _ => 401,
        }
    }

    /// Stable machine-readable code for response bodies.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AuthRequired => "AUTH_REQUIRED",
            Self::InvalidToken(_) => "INVALID_TOKEN",
            Self::InvalidSignature => "INVALID_SIGNATURE",
            Self::Blacklisted => "TOKEN_BLACKLISTED",
            Self::EnvironmentMismatch => "ENVIRONMENT_MISMATCH",
            Self::TokenExpired(_) => "TOKEN_EXPIRED",
            Self::RefreshWindowElapsed => "REFRESH_WINDOW_ELAPSED",
            Self::RefreshLockTimeout => "REFRESH_LOCK_TIMEOUT",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::App(_) => "INTERNAL_ERROR",
        }
    }

    /// Shorthand for [`AuthError::InvalidToken`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidToken(reason.into())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::App(inner) => inner,
            AuthError::Forbidden(_) => AppError::new(ErrorKind::Authorization, err.to_string()),
            other => AppError::authentication(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for AuthError {
    fn from(err: serde_json::Error) -> Self {
        Self::App(AppError::from(err))
    }
}
