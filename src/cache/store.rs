//! Cache storage backends.
//!
//! Values are opaque byte blobs (JSON produced by the cache-aside layer). Every backend
//! supports per-entry TTL, prefix purge restricted to one namespace, and monotonic counters
//! used for list generations.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use thiserror::Error;

use super::config::CacheConfig;
use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::store";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache backend error: {0}")]
    Backend(String),
    #[error("cache payload could not be encoded or decoded: {0}")]
    Codec(#[from] serde_json::Error),
}

impl CacheError {
    pub fn backend(err: impl std::fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Short backend name for logs.
    fn backend(&self) -> &'static str;

    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError>;

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;

    /// Deletes every key starting with `prefix` and returns how many were removed.
    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError>;

    /// Current counter value; missing counters read as zero.
    async fn counter(&self, key: &str) -> Result<u64, CacheError>;

    /// Increments a counter and returns the new value.
    async fn incr(&self, key: &str) -> Result<u64, CacheError>;
}

struct Entry {
    data: Bytes,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// In-process LRU backend. Expired entries are dropped lazily on access.
pub struct MemoryStore {
    entries: RwLock<LruCache<String, Entry>>,
    counters: RwLock<HashMap<String, u64>>,
}

impl MemoryStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.memory_capacity_non_zero())),
            counters: RwLock::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        // `LruCache::get` promotes the entry, so even reads take the write lock.
        let mut entries = rw_write(&self.entries, SOURCE, "get");
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.data.clone())),
            Some(_) => {
                entries.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let entry = Entry {
            data: value,
            expires_at: Instant::now() + ttl,
        };
        rw_write(&self.entries, SOURCE, "set").put(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        rw_write(&self.entries, SOURCE, "delete").pop(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut entries = rw_write(&self.entries, SOURCE, "delete_prefix");
        let doomed: Vec<String> = entries
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            entries.pop(key);
        }
        Ok(doomed.len() as u64)
    }

    async fn counter(&self, key: &str) -> Result<u64, CacheError> {
        Ok(rw_read(&self.counters, SOURCE, "counter")
            .get(key)
            .copied()
            .unwrap_or(0))
    }

    async fn incr(&self, key: &str) -> Result<u64, CacheError> {
        let mut counters = rw_write(&self.counters, SOURCE, "incr");
        let value = counters.entry(key.to_string()).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(capacity: usize) -> MemoryStore {
        MemoryStore::new(&CacheConfig {
            memory_capacity: capacity,
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let store = store(8);
        store
            .set("forums:item:1", Bytes::from_static(b"{}"), Duration::ZERO)
            .await
            .unwrap();
        assert_eq!(store.get("forums:item:1").await.unwrap(), None);
        assert!(store.is_empty());

        store
            .set("forums:item:2", Bytes::from_static(b"[]"), Duration::from_secs(60))
            .await
            .unwrap();
        assert_eq!(
            store.get("forums:item:2").await.unwrap(),
            Some(Bytes::from_static(b"[]"))
        );
    }

    #[tokio::test]
    async fn prefix_purge_stays_inside_namespace() {
        let store = store(16);
        let ttl = Duration::from_secs(60);
        for key in [
            "jobs:list:1:10:a",
            "jobs:list:2:10:a",
            "jobs:item:1",
            "news:list:1:10:a",
        ] {
            store.set(key, Bytes::from_static(b"1"), ttl).await.unwrap();
        }

        let removed = store.delete_prefix("jobs:list:").await.unwrap();

        assert_eq!(removed, 2);
        assert!(store.get("jobs:item:1").await.unwrap().is_some());
        assert!(store.get("news:list:1:10:a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn least_recently_used_entry_is_evicted() {
        let store = store(2);
        let ttl = Duration::from_secs(60);
        store.set("a", Bytes::from_static(b"1"), ttl).await.unwrap();
        store.set("b", Bytes::from_static(b"2"), ttl).await.unwrap();
        store.get("a").await.unwrap();
        store.set("c", Bytes::from_static(b"3"), ttl).await.unwrap();

        assert!(store.get("a").await.unwrap().is_some());
        assert!(store.get("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn counters_start_at_zero() {
        let store = store(2);
        assert_eq!(store.counter("news:gen").await.unwrap(), 0);
        assert_eq!(store.incr("news:gen").await.unwrap(), 1);
        assert_eq!(store.incr("news:gen").await.unwrap(), 2);
        assert_eq!(store.counter("news:gen").await.unwrap(), 2);
    }
}
