//! Cache backend selection at startup.

use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{CacheAside, CacheConfig, CacheStore, MemoryStore, RedisStore};
use crate::config::{CacheBackend, CacheSettings};

/// Builds the configured cache. An unreachable Redis degrades to the in-process store.
pub async fn build(settings: &CacheSettings) -> CacheAside {
    let config = CacheConfig::from(settings);
    let store: Arc<dyn CacheStore> = match &settings.backend {
        CacheBackend::Memory => Arc::new(MemoryStore::new(&config)),
        CacheBackend::Redis {
            url,
            pool_size,
            timeout,
        } => match RedisStore::connect(url, pool_size.get(), *timeout).await {
            Ok(store) => Arc::new(store),
            Err(err) => {
                warn!(
                    target: "alumni::cache",
                    error = %err,
                    "Redis unavailable, falling back to in-memory cache"
                );
                Arc::new(MemoryStore::new(&config))
            }
        },
    };
    info!(
        target: "alumni::cache",
        backend = store.backend(),
        invalidation = config.invalidation.as_str(),
        "Cache ready"
    );
    CacheAside::new(store, config)
}
