//! Token store: session snapshots, blacklist entries, refresh locks and
//! refresh hand-off entries on top of the shared cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use tokenguard_cache::keys;
use tokenguard_cache::provider::CacheManager;
use tokenguard_core::traits::CacheProvider;
use tokenguard_core::types::Identity;

use crate::error::AuthResult;

/// Thin typed layer over the cache used by the session engine.
#[derive(Debug, Clone)]
pub struct TokenStore {
    cache: Arc<CacheManager>,
}

impl TokenStore {
    pub fn new(cache: Arc<CacheManager>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &CacheManager {
        &self.cache
    }

    /// Blacklists a token id. The value is the revocation timestamp.
    pub async fn blacklist(&self, jti: &str, ttl: Duration) -> AuthResult<()> {
        let revoked_at = Utc::now().timestamp().to_string();
        self.cache.set(&keys::blacklist(jti), &revoked_at, ttl).await?;
        debug!(jti, ttl_secs = ttl.as_secs(), "Token blacklisted");
        Ok(())
    }

    pub async fn is_blacklisted(&self, jti: &str) -> AuthResult<bool> {
        Ok(self.cache.exists(&keys::blacklist(jti)).await?)
    }

    /// Stores the identity snapshot of `(scene, subject)`.
    pub async fn put_session(
        &self,
        scene: &str,
        subject: &str,
        identity: &Identity,
        ttl: Duration,
    ) -> AuthResult<()> {
        self.cache
            .set_json(&keys::session(scene, subject), identity, ttl)
            .await?;
        Ok(())
    }

    pub async fn session(&self, scene: &str, subject: &str) -> AuthResult<Option<Identity>> {
        Ok(self.cache.get_json(&keys::session(scene, subject)).await?)
    }

    pub async fn has_session(&self, scene: &str, subject: &str) -> AuthResult<bool> {
        Ok(self.cache.exists(&keys::session(scene, subject)).await?)
    }

    pub async fn evict_session(&self, scene: &str, subject: &str) -> AuthResult<()> {
        self.cache.delete(&keys::session(scene, subject)).await?;
        Ok(())
    }

    /// Tries to take the refresh lock for a payload hash. Returns the owner
    /// id on success.
    pub async fn acquire_lock(&self, payload_hash: &str, ttl: Duration) -> AuthResult<Option<String>> {
        let owner = Uuid::new_v4().to_string();
        let acquired = self
            .cache
            .set_nx(&keys::refresh_lock(payload_hash), &owner, ttl)
            .await?;
        Ok(acquired.then_some(owner))
    }

    /// Releases the refresh lock if it is still held by `owner`.
    pub async fn release_lock(&self, payload_hash: &str, owner: &str) -> AuthResult<()> {
        let key = keys::refresh_lock(payload_hash);
        match self.cache.get(&key).await? {
            Some(current) if current == owner => {
                self.cache.delete(&key).await?;
            }
            Some(_) => warn!(key = %key, "Refresh lock expired and was taken over"),
            None => debug!(key = %key, "Refresh lock already expired"),
        }
        Ok(())
    }

    /// Records the token minted when `old_jti` was refreshed.
    pub async fn record_handoff(&self, old_jti: &str, token: &str, ttl: Duration) -> AuthResult<()> {
        self.cache.set(&keys::refreshed(old_jti), token, ttl).await?;
        Ok(())
    }

    pub async fn handoff(&self, old_jti: &str) -> AuthResult<Option<String>> {
        Ok(self.cache.get(&keys::refreshed(old_jti)).await?)
    }
}
