//! `AuthUser` extractor: the identity attached by the auth middleware.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use tokenguard_auth::{AuthError, Token};
use tokenguard_core::types::Identity;

use crate::error::ApiError;

/// Authenticated caller, inserted into the request extensions by
/// [`require_auth`](crate::middleware::auth::require_auth).
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Scene the token was validated against.
    pub scene: String,
    /// Identity snapshot of the subject.
    pub identity: Identity,
    /// The validated (possibly freshly refreshed) token.
    pub token: Token,
    /// Whether the subject is the scene's super administrator.
    pub super_admin: bool,
}

impl AuthUser {
    pub fn id(&self) -> &str {
        &self.identity.id
    }
}

impl<S: Send + Sync> FromRequestParts<S> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(ApiError::Auth(AuthError::AuthRequired))
    }
}
