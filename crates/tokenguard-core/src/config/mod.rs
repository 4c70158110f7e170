//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section.

pub mod app;
pub mod auth;
pub mod cache;
pub mod logging;

use serde::{Deserialize, Serialize};

pub use self::app::ServerConfig;
pub use self::auth::{AuthConfig, SceneConfig};
pub use self::cache::CacheConfig;
pub use self::logging::LoggingConfig;

use crate::error::AppError;
use crate::types::Account;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Cache provider settings.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Scene table.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Accounts served by the bundled identity provider.
    #[serde(default)]
    pub accounts: Vec<Account>,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// The file is optional; values are overlaid with environment variables
    /// prefixed with `TOKENGUARD__` (for example
    /// `TOKENGUARD__AUTH__SCENES__ADMIN__SECRET`).
    pub fn load(path: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("TOKENGUARD")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        let app: Self = config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))?;

        app.auth.validate()?;
        Ok(app)
    }
}
