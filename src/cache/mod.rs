//! Cache-aside layer shared by every resource service.
//!
//! Lists and single records are cached as JSON under namespaced keys (see [`keys`]) in either
//! an in-process LRU or Redis. Writes purge a namespace's lists and the touched item once the
//! store write has committed.
//!
//! ```toml
//! [cache]
//! backend = "memory"          # or "redis"
//! list_ttl_seconds = 60
//! item_ttl_seconds = 300
//! invalidation = "scan"       # or "generation"
//! ```

mod aside;
mod config;
pub mod keys;
mod lock;
mod redis_store;
mod store;

pub use aside::{
    CacheAside, METRIC_CACHE_ERROR, METRIC_CACHE_HIT, METRIC_CACHE_INVALIDATE, METRIC_CACHE_MISS,
};
pub use config::{CacheConfig, InvalidationStrategy};
pub use redis_store::RedisStore;
pub use store::{CacheError, CacheStore, MemoryStore};
