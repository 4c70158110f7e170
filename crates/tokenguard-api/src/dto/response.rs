//! Response DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tokenguard_core::types::Identity;

use crate::extractors::AuthUser;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Issued or refreshed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    /// Always `Bearer`.
    pub token_type: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
    /// Last moment the token can be refreshed.
    pub refresh_expires_at: DateTime<Utc>,
}

/// The authenticated identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: String,
    pub scene: String,
    pub permission_codes: Vec<String>,
    pub role_codes: Vec<String>,
    pub post_codes: Vec<String>,
    pub super_admin: bool,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub info: serde_json::Value,
    /// Id of the token the request was authenticated with.
    pub token_id: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<&AuthUser> for MeResponse {
    fn from(auth: &AuthUser) -> Self {
        Self {
            id: auth.identity.id.clone(),
            scene: auth.scene.clone(),
            permission_codes: auth.identity.permission_codes.clone(),
            role_codes: auth.identity.role_codes.clone(),
            post_codes: auth.identity.post_codes.clone(),
            super_admin: auth.super_admin,
            info: auth.identity.info.clone(),
            token_id: auth.token.id().map(str::to_string),
            expires_at: auth
                .token
                .expires_at()
                .and_then(|exp| DateTime::from_timestamp(exp, 0)),
        }
    }
}

/// Account summary for admin listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: String,
    pub role_codes: Vec<String>,
    pub post_codes: Vec<String>,
}

impl From<&Identity> for AccountResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.id.clone(),
            role_codes: identity.role_codes.clone(),
            post_codes: identity.post_codes.clone(),
        }
    }
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    /// The message.
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `ok` or `degraded`.
    pub status: String,
    /// Whether the cache answered.
    pub cache: bool,
    pub version: String,
    /// Configured scenes.
    pub scenes: Vec<String>,
}
