//! Redis backend for the cache store.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use deadpool_redis::redis::{AsyncCommands, cmd};
use deadpool_redis::{Config, Pool, PoolConfig, Runtime, Timeouts};
use tracing::debug;

use super::store::{CacheError, CacheStore};

const SCAN_BATCH: usize = 200;

pub struct RedisStore {
    pool: Pool,
}

impl RedisStore {
    /// Builds the pool and checks out one connection so a dead server is noticed at startup.
    pub async fn connect(url: &str, pool_size: usize, timeout: Duration) -> Result<Self, CacheError> {
        let mut config = Config::from_url(url);
        let mut pool_config = PoolConfig::new(pool_size.max(1));
        pool_config.timeouts = Timeouts {
            wait: Some(timeout),
            create: Some(timeout),
            recycle: Some(timeout),
        };
        config.pool = Some(pool_config);

        let pool = config
            .create_pool(Some(Runtime::Tokio1))
            .map_err(CacheError::backend)?;
        pool.get().await.map_err(CacheError::backend)?;
        Ok(Self { pool })
    }

    async fn conn(&self) -> Result<deadpool_redis::Connection, CacheError> {
        self.pool.get().await.map_err(CacheError::backend)
    }
}

#[async_trait]
impl CacheStore for RedisStore {
    fn backend(&self) -> &'static str {
        "redis"
    }

    async fn get(&self, key: &str) -> Result<Option<Bytes>, CacheError> {
        let mut conn = self.conn().await?;
        let value: Option<Vec<u8>> = conn.get(key).await.map_err(CacheError::backend)?;
        Ok(value.map(Bytes::from))
    }

    async fn set(&self, key: &str, value: Bytes, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        // SET EX rejects zero.
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(key, value.as_ref(), seconds)
            .await
            .map_err(CacheError::backend)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self.conn().await?;
        conn.del::<_, ()>(key).await.map_err(CacheError::backend)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn().await?;
        let pattern = format!("{}*", escape_glob(prefix));
        let mut cursor: u64 = 0;
        let mut removed: u64 = 0;
        loop {
            let (next, keys): (u64, Vec<String>) = cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await
                .map_err(CacheError::backend)?;
            if !keys.is_empty() {
                let deleted: u64 = conn.del(&keys).await.map_err(CacheError::backend)?;
                removed += deleted;
            }
            if next == 0 {
                break;
            }
            cursor = next;
        }
        debug!(target: "alumni::cache", prefix, removed, "Purged redis keys by prefix");
        Ok(removed)
    }

    async fn counter(&self, key: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn().await?;
        let value: Option<u64> = conn.get(key).await.map_err(CacheError::backend)?;
        Ok(value.unwrap_or(0))
    }

    async fn incr(&self, key: &str) -> Result<u64, CacheError> {
        let mut conn = self.conn().await?;
        conn.incr(key, 1u64).await.map_err(CacheError::backend)
    }
}

/// Escapes glob metacharacters so a namespace prefix matches literally in `SCAN MATCH`.
fn escape_glob(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for ch in prefix.chars() {
        if matches!(ch, '*' | '?' | '[' | ']' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}
