//! Scene registry: one session manager per configured scene.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::info;

use tokenguard_cache::provider::CacheManager;
use tokenguard_core::config::AuthConfig;
use tokenguard_core::error::AppError;
use tokenguard_core::result::AppResult;
use tokenguard_core::traits::IdentityProvider;
use tokenguard_core::types::Identity;

use crate::error::{AuthError, AuthResult};
use crate::keyring::Keyring;
use crate::session::{SessionManager, TokenStore};
use crate::token::Token;

/// Owns the session managers of every scene. All managers share one keyring
/// and one token store.
#[derive(Debug, Clone)]
pub struct AuthManager {
    default: Arc<SessionManager>,
    managers: HashMap<String, Arc<SessionManager>>,
    keyring: Arc<Keyring>,
}

impl AuthManager {
    /// Builds a manager per scene of `config`.
    pub fn new(
        config: &AuthConfig,
        cache: Arc<CacheManager>,
        identities: Option<Arc<dyn IdentityProvider>>,
    ) -> AppResult<Self> {
        config.validate()?;

        let keyring = Arc::new(Keyring::from_config(config)?);
        let store = TokenStore::new(cache);

        let mut managers = HashMap::with_capacity(config.scenes.len());
        for (name, scene) in &config.scenes {
            let manager = SessionManager::new(
                name,
                scene.clone(),
                Arc::clone(&keyring),
                store.clone(),
                identities.clone(),
            )?;
            managers.insert(name.clone(), Arc::new(manager));
        }

        let default = managers
            .get(&config.default_scene)
            .cloned()
            .ok_or_else(|| {
                AppError::configuration(format!(
                    "Default scene '{}' is not configured",
                    config.default_scene
                ))
            })?;

        info!(
            scenes = managers.len(),
            default_scene = %config.default_scene,
            "Auth manager initialized"
        );

        Ok(Self {
            default,
            managers,
            keyring,
        })
    }

    /// Manager of the default scene.
    pub fn default_scene(&self) -> &Arc<SessionManager> {
        &self.default
    }

    /// Manager of a named scene.
    pub fn scene(&self, name: &str) -> Option<&Arc<SessionManager>> {
        self.managers.get(name)
    }

    pub fn scene_names(&self) -> impl Iterator<Item = &str> {
        self.managers.keys().map(String::as_str)
    }

    /// Parses a token of any configured scene.
    pub fn parse(&self, raw: &str, verify_signature: bool) -> AuthResult<Token> {
        Token::parse(raw, &self.keyring, verify_signature)
    }

    /// Evicts the session of `identity` in `scene`, invalidating its tokens.
    pub async fn force_exit(&self, scene: &str, identity: &Identity) -> AuthResult<bool> {
        let manager = self.scene(scene).ok_or_else(|| {
            AuthError::App(AppError::not_found(format!("Scene '{scene}' is not configured")))
        })?;
        manager.force_exit(identity).await
    }
}
