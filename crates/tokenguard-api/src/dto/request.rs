//! Request DTOs.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Login request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    /// Account id.
    pub id: String,
    /// Plain-text password.
    pub password: String,
    /// Custom claims to embed in the token. Registered claims are ignored.
    #[serde(default)]
    pub claims: Map<String, Value>,
}
