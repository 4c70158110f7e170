//! Authentication scene configuration.
//!
//! A scene is a named configuration namespace (tenant or application
//! context) with its own secret, token lifetimes, signing algorithm, and
//! device policy. Scenes are isolated from each other.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Upper bound for `ttl` and `refresh_ttl`: ten years, in seconds.
pub const MAX_LIFETIME_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Name of the scene used when none is configured explicitly.
pub const DEFAULT_SCENE: &str = "admin";

/// Authentication configuration: the scene table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Scene used by callers that do not name one.
    #[serde(default = "default_scene")]
    pub default_scene: String,
    /// Per-scene settings keyed by scene name.
    #[serde(default = "default_scenes")]
    pub scenes: HashMap<String, SceneConfig>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            default_scene: default_scene(),
            scenes: default_scenes(),
        }
    }
}

impl AuthConfig {
    /// Returns the configuration of the named scene.
    pub fn scene(&self, name: &str) -> Option<&SceneConfig> {
        self.scenes.get(name)
    }

    /// Validates every scene and checks that the default scene exists.
    pub fn validate(&self) -> Result<(), AppError> {
        if !self.scenes.contains_key(&self.default_scene) {
            return Err(AppError::configuration(format!(
                "Default scene '{}' is not configured",
                self.default_scene
            )));
        }
        for (name, scene) in &self.scenes {
            scene.validate(name)?;
        }
        Ok(())
    }
}

/// Settings for a single scene.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Signing secret shared by every algorithm of this scene.
    pub secret: String,
    /// Token lifetime in seconds.
    #[serde(default = "default_ttl")]
    pub ttl: u64,
    /// Seconds after expiry during which a token may still be refreshed.
    /// Zero disables refresh.
    #[serde(default = "default_refresh_ttl")]
    pub refresh_ttl: u64,
    /// Algorithm id used to sign new tokens.
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
    /// Additional algorithm ids accepted when verifying (rotation).
    #[serde(default)]
    pub drivers: Vec<String>,
    /// Request/response header carrying the bearer token.
    #[serde(default = "default_header_name")]
    pub header_name: String,
    /// Whether the request guard refreshes expired tokens transparently.
    #[serde(default = "default_true")]
    pub auto_refresh: bool,
    /// Number of refresh lock attempts budgeted.
    #[serde(default = "default_retry")]
    pub retry: u32,
    /// Delay between refresh lock attempts, in seconds.
    #[serde(default = "default_retry_time")]
    pub retry_time: u64,
    /// Single-device mode: reject tokens presented from another environment.
    #[serde(default)]
    pub single: bool,
    /// Keep an identity snapshot per subject in the shared cache.
    #[serde(default = "default_true")]
    pub stateful: bool,
    /// Subject id that bypasses permission-code checks.
    #[serde(default)]
    pub super_admin: Option<String>,
}

impl SceneConfig {
    /// Creates a scene with default settings and the given secret.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            ttl: default_ttl(),
            refresh_ttl: default_refresh_ttl(),
            algorithm: default_algorithm(),
            drivers: Vec::new(),
            header_name: default_header_name(),
            auto_refresh: true,
            retry: default_retry(),
            retry_time: default_retry_time(),
            single: false,
            stateful: true,
            super_admin: None,
        }
    }

    /// Rejects settings that would make every token unusable.
    pub fn validate(&self, name: &str) -> Result<(), AppError> {
        if self.secret.trim().is_empty() {
            return Err(AppError::configuration(format!(
                "Scene '{name}' has an empty secret"
            )));
        }
        if self.ttl == 0 {
            return Err(AppError::configuration(format!(
                "Scene '{name}' must have a ttl greater than zero"
            )));
        }
        if self.ttl > MAX_LIFETIME_SECONDS || self.refresh_ttl > MAX_LIFETIME_SECONDS {
            return Err(AppError::configuration(format!(
                "Scene '{name}' ttl and refresh_ttl must not exceed {MAX_LIFETIME_SECONDS} seconds"
            )));
        }
        if self.header_name.trim().is_empty() {
            return Err(AppError::configuration(format!(
                "Scene '{name}' has an empty header_name"
            )));
        }
        Ok(())
    }
}

fn default_scene() -> String {
    DEFAULT_SCENE.to_string()
}

fn default_scenes() -> HashMap<String, SceneConfig> {
    let mut scenes = HashMap::new();
    scenes.insert(
        DEFAULT_SCENE.to_string(),
        SceneConfig::with_secret("CHANGE_ME_IN_PRODUCTION"),
    );
    scenes
}

fn default_ttl() -> u64 {
    60 * 60 * 24
}

fn default_refresh_ttl() -> u64 {
    60 * 60 * 2
}

fn default_algorithm() -> String {
    "password-hash".to_string()
}

fn default_header_name() -> String {
    "Authorization".to_string()
}

fn default_true() -> bool {
    true
}

fn default_retry() -> u32 {
    2
}

fn default_retry_time() -> u64 {
    1
}
