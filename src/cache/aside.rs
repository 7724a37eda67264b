//! Read-through caching with best-effort invalidation.
//!
//! The store behind [`CacheAside`] is never allowed to fail a request: read errors fall back to
//! the loader, write and purge errors are logged and counted.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use metrics::counter;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::config::{CacheConfig, InvalidationStrategy};
use super::keys;
use super::store::{CacheError, CacheStore};

const TARGET: &str = "alumni::cache";

pub const METRIC_CACHE_HIT: &str = "alumni_cache_hit_total";
pub const METRIC_CACHE_MISS: &str = "alumni_cache_miss_total";
pub const METRIC_CACHE_ERROR: &str = "alumni_cache_error_total";
pub const METRIC_CACHE_INVALIDATE: &str = "alumni_cache_invalidate_total";

#[derive(Clone)]
pub struct CacheAside {
    store: Arc<dyn CacheStore>,
    config: CacheConfig,
}

impl CacheAside {
    pub fn new(store: Arc<dyn CacheStore>, config: CacheConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn backend(&self) -> &'static str {
        self.store.backend()
    }

    /// Key of one list page. `None` means the key could not be built (unreadable generation,
    /// unserializable parameters) and the caller should go straight to the store.
    pub async fn list_key<P>(&self, namespace: &'static str, page: u32, limit: u32, params: &P) -> Option<String>
    where
        P: Serialize + ?Sized,
    {
        let hash = match keys::hash_params(params) {
            Ok(hash) => hash,
            Err(err) => {
                self.record_error(namespace, "hash", &CacheError::from(err));
                return None;
            }
        };
        let generation = match self.config.invalidation {
            InvalidationStrategy::Scan => None,
            InvalidationStrategy::Generation => {
                match self.store.counter(&keys::generation_key(namespace)).await {
                    Ok(generation) => Some(generation),
                    Err(err) => {
                        self.record_error(namespace, "generation", &err);
                        return None;
                    }
                }
            }
        };
        Some(keys::list_key(namespace, generation, page, limit, &hash))
    }

    pub fn item_key(&self, namespace: &'static str, id: &str) -> String {
        keys::item_key(namespace, id)
    }

    /// Cached list page under `key`, loading and storing it on a miss.
    pub async fn list<T, E, F, Fut>(&self, namespace: &'static str, key: Option<String>, load: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.fetch(namespace, key, self.config.list_ttl, load).await
    }

    /// Cached single record; `load` returning `Ok(None)` is not cached.
    pub async fn item<T, E, F, Fut>(&self, namespace: &'static str, id: &str, load: F) -> Result<Option<T>, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>, E>>,
    {
        let key = self.item_key(namespace, id);
        if let Some(hit) = self.lookup::<T>(namespace, &key).await {
            return Ok(Some(hit));
        }
        let loaded = load().await?;
        if let Some(value) = &loaded {
            self.store_value(namespace, &key, value, self.config.item_ttl).await;
        }
        Ok(loaded)
    }

    /// Generic cached value under an explicit key with the item lifetime.
    pub async fn value<T, E, F, Fut>(&self, namespace: &'static str, key: String, load: F) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.fetch(namespace, Some(key), self.config.item_ttl, load).await
    }

    async fn fetch<T, E, F, Fut>(
        &self,
        namespace: &'static str,
        key: Option<String>,
        ttl: Duration,
        load: F,
    ) -> Result<T, E>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(key) = key else {
            return load().await;
        };
        if let Some(hit) = self.lookup::<T>(namespace, &key).await {
            return Ok(hit);
        }
        let value = load().await?;
        self.store_value(namespace, &key, &value, ttl).await;
        Ok(value)
    }

    async fn lookup<T: DeserializeOwned>(&self, namespace: &'static str, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(bytes)) => match serde_json::from_slice::<T>(&bytes) {
                Ok(value) => {
                    counter!(METRIC_CACHE_HIT, "namespace" => namespace).increment(1);
                    debug!(target: TARGET, key, "Cache hit");
                    Some(value)
                }
                Err(err) => {
                    self.record_error(namespace, "decode", &CacheError::from(err));
                    None
                }
            },
            Ok(None) => {
                counter!(METRIC_CACHE_MISS, "namespace" => namespace).increment(1);
                debug!(target: TARGET, key, "Cache miss");
                None
            }
            Err(err) => {
                self.record_error(namespace, "get", &err);
                None
            }
        }
    }

    async fn store_value<T: Serialize>(&self, namespace: &'static str, key: &str, value: &T, ttl: Duration) {
        let encoded = match serde_json::to_vec(value) {
            Ok(encoded) => Bytes::from(encoded),
            Err(err) => {
                self.record_error(namespace, "encode", &CacheError::from(err));
                return;
            }
        };
        if let Err(err) = self.store.set(key, encoded, ttl).await {
            self.record_error(namespace, "set", &err);
        }
    }

    /// Makes every list page of `namespace` unreachable and drops the item entry for `id`.
    ///
    /// Runs after the write committed; failures are logged and swallowed because the entries
    /// still expire by TTL.
    pub async fn invalidate(&self, namespace: &'static str, id: Option<&str>) {
        counter!(METRIC_CACHE_INVALIDATE, "namespace" => namespace).increment(1);

        match self.config.invalidation {
            InvalidationStrategy::Scan => {
                match self.store.delete_prefix(&keys::list_prefix(namespace)).await {
                    Ok(removed) => {
                        debug!(target: TARGET, namespace, removed, "Purged list cache");
                    }
                    Err(err) => self.record_error(namespace, "invalidate.lists", &err),
                }
            }
            InvalidationStrategy::Generation => {
                match self.store.incr(&keys::generation_key(namespace)).await {
                    Ok(generation) => {
                        debug!(target: TARGET, namespace, generation, "Advanced list generation");
                    }
                    Err(err) => self.record_error(namespace, "invalidate.generation", &err),
                }
            }
        }

        if let Some(id) = id
            && let Err(err) = self.store.delete(&keys::item_key(namespace, id)).await
        {
            self.record_error(namespace, "invalidate.item", &err);
        }
    }

    /// Drops one item entry without touching the lists.
    pub async fn forget(&self, namespace: &'static str, id: &str) {
        if let Err(err) = self.store.delete(&keys::item_key(namespace, id)).await {
            self.record_error(namespace, "forget", &err);
        }
    }

    fn record_error(&self, namespace: &'static str, op: &'static str, err: &CacheError) {
        counter!(METRIC_CACHE_ERROR, "namespace" => namespace, "op" => op).increment(1);
        warn!(
            target: TARGET,
            namespace,
            op,
            backend = self.store.backend(),
            error = %err,
            "Cache operation failed; continuing without cache"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::cache::store::MemoryStore;

    fn aside(strategy: InvalidationStrategy) -> CacheAside {
        let config = CacheConfig {
            invalidation: strategy,
            ..Default::default()
        };
        CacheAside::new(Arc::new(MemoryStore::new(&config)), config)
    }

    async fn load_counting(calls: &AtomicUsize, value: u32) -> Result<u32, ()> {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(value)
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let cache = aside(InvalidationStrategy::Scan);
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            let key = cache.list_key("jobs", 1, 10, &serde_json::json!({"q": "rust"})).await;
            let value = cache.list("jobs", key, || load_counting(&calls, 7)).await.unwrap();
            assert_eq!(value, 7);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidation_forces_reload_for_both_strategies() {
        for strategy in [InvalidationStrategy::Scan, InvalidationStrategy::Generation] {
            let cache = aside(strategy);
            let calls = AtomicUsize::new(0);
            let params = serde_json::json!({});

            let key = cache.list_key("news", 1, 10, &params).await;
            cache.list("news", key, || load_counting(&calls, 1)).await.unwrap();
            cache.invalidate("news", None).await;
            let key = cache.list_key("news", 1, 10, &params).await;
            let value = cache.list("news", key, || load_counting(&calls, 2)).await.unwrap();

            assert_eq!(value, 2, "{strategy:?}");
            assert_eq!(calls.load(Ordering::SeqCst), 2, "{strategy:?}");
        }
    }

    #[tokio::test]
    async fn missing_items_are_not_cached() {
        let cache = aside(InvalidationStrategy::Scan);
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            let found: Option<u32> = cache
                .item("forums", "x", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, ()>(None)
                })
                .await
                .unwrap();
            assert!(found.is_none());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn item_invalidation_only_drops_that_item() {
        let cache = aside(InvalidationStrategy::Scan);
        let calls = AtomicUsize::new(0);
        let load = |value| {
            let calls = &calls;
            move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(Some(value))
            }
        };
        cache.item("products", "a", load(1u32)).await.unwrap();
        cache.item("products", "b", load(2u32)).await.unwrap();
        cache.invalidate("products", Some("a")).await;
        cache.item("products", "a", load(1u32)).await.unwrap();
        cache.item("products", "b", load(2u32)).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
