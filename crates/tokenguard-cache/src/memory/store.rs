//! In-memory cache implementation using the moka crate.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use tracing::debug;

use tokenguard_core::config::cache::MemoryCacheConfig;
use tokenguard_core::result::AppResult;
use tokenguard_core::traits::cache::CacheProvider;

/// A cached string together with the TTL it was written with.
#[derive(Debug, Clone)]
struct CachedEntry {
    value: Arc<str>,
    ttl: Duration,
}

/// Per-entry expiry policy: every write carries its own TTL.
struct PerEntryTtl;

impl Expiry<String, CachedEntry> for PerEntryTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &CachedEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &CachedEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// In-memory cache provider using moka.
#[derive(Debug, Clone)]
pub struct MemoryCacheProvider {
    /// The underlying moka cache.
    cache: Cache<String, CachedEntry>,
}

impl MemoryCacheProvider {
    /// Create a new in-memory cache from configuration.
    ///
    /// No capacity bound is set: a bounded moka cache may refuse or evict
    /// writes, which would silently drop revocations.
    pub fn new(config: &MemoryCacheConfig) -> Self {
        let cache = Cache::builder()
            .initial_capacity(config.initial_capacity)
            .expire_after(PerEntryTtl)
            .build();

        Self { cache }
    }

    fn entry(value: &str, ttl: Duration) -> CachedEntry {
        CachedEntry {
            value: Arc::from(value),
            ttl,
        }
    }
}

#[async_trait]
impl CacheProvider for MemoryCacheProvider {
    async fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.cache.get(key).await.map(|e| e.value.to_string()))
    }

    async fn set(&self, key: &str, value: &str, ttl: Duration) -> AppResult<()> {
        self.cache
            .insert(key.to_string(), Self::entry(value, ttl))
            .await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.cache.remove(key).await;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.cache.get(key).await.is_some())
    }

    async fn set_nx(&self, key: &str, value: &str, ttl: Duration) -> AppResult<bool> {
        // The entry API initialises at most once per key, so concurrent
        // callers observe exactly one fresh insert.
        let entry = self
            .cache
            .entry(key.to_string())
            .or_insert_with(async { Self::entry(value, ttl) })
            .await;
        let inserted = entry.is_fresh();
        debug!(key, inserted, "set_nx");
        Ok(inserted)
    }

    async fn expire(&self, key: &str, ttl: Duration) -> AppResult<bool> {
        match self.cache.get(key).await {
            Some(existing) => {
                self.cache
                    .insert(key.to_string(), Self::entry(&existing.value, ttl))
                    .await;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn health_check(&self) -> AppResult<bool> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_provider() -> MemoryCacheProvider {
        MemoryCacheProvider::new(&MemoryCacheConfig {
            initial_capacity: 16,
        })
    }

    #[tokio::test]
    async fn test_set_get() {
        let provider = make_provider();
        provider
            .set("key1", "value1", Duration::from_secs(60))
            .await
            .unwrap();
        let val = provider.get("key1").await.unwrap();
        assert_eq!(val, Some("value1".to_string()));
        assert!(provider.exists("key1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let provider = make_provider();
        provider
            .set("key2", "value2", Duration::from_secs(60))
            .await
            .unwrap();
        provider.delete("key2").await.unwrap();
        assert_eq!(provider.get("key2").await.unwrap(), None);
        assert!(!provider.exists("key2").await.unwrap());
    }

    #[tokio::test]
    async fn test_per_entry_ttl() {
        let provider = make_provider();
        provider
            .set("short", "v", Duration::from_millis(100))
            .await
            .unwrap();
        provider
            .set("long", "v", Duration::from_secs(60))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(provider.get("short").await.unwrap(), None);
        assert_eq!(provider.get("long").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_set_nx() {
        let provider = make_provider();
        let first = provider
            .set_nx("nx_key", "val", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(first);
        let second = provider
            .set_nx("nx_key", "val2", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(!second);
        assert_eq!(provider.get("nx_key").await.unwrap(), Some("val".to_string()));
    }

    #[tokio::test]
    async fn test_set_nx_after_expiry() {
        let provider = make_provider();
        assert!(
            provider
                .set_nx("lock", "1", Duration::from_millis(50))
                .await
                .unwrap()
        );
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(
            provider
                .set_nx("lock", "1", Duration::from_secs(5))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_set_nx_concurrent_single_winner() {
        let provider = make_provider();
        let mut handles = Vec::new();
        for i in 0..16 {
            let p = provider.clone();
            handles.push(tokio::spawn(async move {
                p.set_nx("race", &i.to_string(), Duration::from_secs(5))
                    .await
                    .unwrap()
            }));
        }
        let mut winners = 0;
        for h in handles {
            if h.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[tokio::test]
    async fn test_expire_missing_key() {
        let provider = make_provider();
        assert!(!provider.expire("nope", Duration::from_secs(1)).await.unwrap());
        provider
            .set("k", "v", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(provider.expire("k", Duration::from_secs(5)).await.unwrap());
        assert_eq!(provider.get("k").await.unwrap(), Some("v".to_string()));
    }

    #[tokio::test]
    async fn test_writes_kept_when_cache_is_busy() {
        let provider = make_provider();
        for i in 0..2000 {
            provider
                .set(&format!("admin_{i}"), "{}", Duration::from_secs(60))
                .await
                .unwrap();
        }
        for _ in 0..3 {
            for i in 0..2000 {
                provider.get(&format!("admin_{i}")).await.unwrap();
            }
        }

        for i in 0..20 {
            let key = format!("blacklist:{i}");
            provider.set(&key, "1", Duration::from_secs(60)).await.unwrap();
            assert!(provider.exists(&key).await.unwrap(), "{key} was dropped");
        }
        assert!(provider.exists("admin_0").await.unwrap());
    }

    #[tokio::test]
    async fn test_json_roundtrip() {
        let provider = make_provider();
        let data = serde_json::json!({"name": "test", "count": 42});
        provider
            .set_json("json_key", &data, Duration::from_secs(60))
            .await
            .unwrap();
        let result: Option<serde_json::Value> = provider.get_json("json_key").await.unwrap();
        assert_eq!(result, Some(data));
    }
}
