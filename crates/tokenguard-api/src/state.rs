//! Application state shared across all handlers and middleware.

use std::collections::HashMap;
use std::sync::Arc;

use tokenguard_auth::{AuthManager, PasswordHasher, SessionManager};
use tokenguard_cache::provider::CacheManager;
use tokenguard_core::config::AppConfig;
use tokenguard_core::result::AppResult;
use tokenguard_core::traits::{IdentityProvider, StaticIdentityProvider};
use tokenguard_core::types::Account;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
/// All fields are `Arc`-wrapped for cheap cloning across tasks.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Cache manager (Redis or in-memory)
    pub cache: Arc<CacheManager>,
    /// Session managers of every scene
    pub auth: Arc<AuthManager>,
    /// Login accounts keyed by identity id
    pub accounts: Arc<HashMap<String, Account>>,
    /// Password hasher (Argon2)
    pub password_hasher: Arc<PasswordHasher>,
}

impl AppState {
    /// Wires the auth system over an initialized cache.
    pub fn new(config: AppConfig, cache: Arc<CacheManager>) -> AppResult<Self> {
        let identities: Arc<dyn IdentityProvider> = Arc::new(StaticIdentityProvider::new(
            config
                .accounts
                .iter()
                .map(|account| account.identity.clone())
                .collect(),
        ));
        let auth = AuthManager::new(&config.auth, Arc::clone(&cache), Some(identities))?;
        let accounts = config
            .accounts
            .iter()
            .map(|account| (account.identity.id.clone(), account.clone()))
            .collect();

        Ok(Self {
            config: Arc::new(config),
            cache,
            auth: Arc::new(auth),
            accounts: Arc::new(accounts),
            password_hasher: Arc::new(PasswordHasher::new()),
        })
    }

    /// Session manager of the default scene, used by the HTTP layer.
    pub fn sessions(&self) -> &Arc<SessionManager> {
        self.auth.default_scene()
    }
}
