//! Per-scene secrets and signers.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use tokenguard_core::config::{AuthConfig, SceneConfig};
use tokenguard_core::result::AppResult;

use crate::error::{AuthError, AuthResult};
use crate::signer::digest::md5_hex;
use crate::signer::{Algorithm, Signer, build_signer};

/// Signing material of one scene: its secret, default signer and the
/// additional signers registered for rotation.
pub struct SceneKeys {
    name: String,
    secret: String,
    default: Arc<dyn Signer>,
    signers: HashMap<Algorithm, Arc<dyn Signer>>,
}

impl std::fmt::Debug for SceneKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneKeys")
            .field("name", &self.name)
            .field("default", &self.default.algorithm())
            .field("signers", &self.signers.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl SceneKeys {
    /// Builds the signers named by a scene configuration.
    ///
    /// Unknown algorithm ids are a configuration error.
    pub fn from_config(name: &str, config: &SceneConfig) -> AppResult<Self> {
        let algorithm: Algorithm = config.algorithm.parse()?;
        let default = build_signer(algorithm, &config.secret)?;
        let mut signers = HashMap::new();
        signers.insert(algorithm, Arc::clone(&default));

        for id in &config.drivers {
            let algorithm: Algorithm = id.parse()?;
            if !signers.contains_key(&algorithm) {
                signers.insert(algorithm, build_signer(algorithm, &config.secret)?);
            }
        }

        debug!(scene = %name, default = %algorithm, count = signers.len(), "Scene signers ready");

        Ok(Self {
            name: name.to_string(),
            secret: config.secret.clone(),
            default,
            signers,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }

    /// Signer used for newly encoded tokens.
    pub fn default_signer(&self) -> &dyn Signer {
        self.default.as_ref()
    }

    /// Selects the signer for an `alg` header value; `None` selects the
    /// default. An unknown or unregistered id is an invalid token.
    pub fn signer(&self, algorithm: Option<&str>) -> AuthResult<&dyn Signer> {
        let Some(id) = algorithm else {
            return Ok(self.default_signer());
        };
        let algorithm: Algorithm = id
            .parse()
            .map_err(|_| AuthError::invalid(format!("unknown algorithm '{id}'")))?;
        self.signers
            .get(&algorithm)
            .map(|s| s.as_ref())
            .ok_or_else(|| {
                AuthError::invalid(format!(
                    "algorithm '{id}' is not registered for scene '{}'",
                    self.name
                ))
            })
    }

    /// Device fingerprint: `md5_hex(user_agent + secret)`.
    pub fn fingerprint(&self, user_agent: &str) -> String {
        md5_hex(format!("{user_agent}{}", self.secret))
    }
}

/// Signing material of every configured scene.
#[derive(Debug, Default)]
pub struct Keyring {
    scenes: HashMap<String, Arc<SceneKeys>>,
}

impl Keyring {
    /// Builds the keyring for every scene of the configuration.
    pub fn from_config(config: &AuthConfig) -> AppResult<Self> {
        let mut keyring = Self::default();
        for (name, scene) in &config.scenes {
            keyring.insert(SceneKeys::from_config(name, scene)?);
        }
        Ok(keyring)
    }

    pub fn insert(&mut self, keys: SceneKeys) {
        self.scenes.insert(keys.name.clone(), Arc::new(keys));
    }

    pub fn scene(&self, name: &str) -> Option<&Arc<SceneKeys>> {
        self.scenes.get(name)
    }

    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.scenes.keys().map(String::as_str)
    }
}
