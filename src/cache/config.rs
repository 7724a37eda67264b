//! Cache configuration.
//!
//! Controls entry lifetimes, the in-process capacity and how list caches are invalidated.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_LIST_TTL_SECONDS: u64 = 60;
const DEFAULT_ITEM_TTL_SECONDS: u64 = 300;
const DEFAULT_MEMORY_CAPACITY: usize = 4096;

/// How a write makes the cached list pages of its namespace unreachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationStrategy {
    /// Delete every `{namespace}:list:*` key by prefix scan.
    Scan,
    /// Bump `{namespace}:gen`; list keys embed the generation so old pages are never read again.
    Generation,
}

impl InvalidationStrategy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "scan" => Some(Self::Scan),
            "generation" => Some(Self::Generation),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Generation => "generation",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Lifetime of cached list pages.
    pub list_ttl: Duration,
    /// Lifetime of cached single records.
    pub item_ttl: Duration,
    pub invalidation: InvalidationStrategy,
    /// Maximum entries held by the in-process backend.
    pub memory_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            list_ttl: Duration::from_secs(DEFAULT_LIST_TTL_SECONDS),
            item_ttl: Duration::from_secs(DEFAULT_ITEM_TTL_SECONDS),
            invalidation: InvalidationStrategy::Scan,
            memory_capacity: DEFAULT_MEMORY_CAPACITY,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            list_ttl: Duration::from_secs(settings.list_ttl_seconds.get()),
            item_ttl: Duration::from_secs(settings.item_ttl_seconds.get()),
            invalidation: settings.invalidation,
            memory_capacity: settings.memory_capacity.get(),
        }
    }
}

impl CacheConfig {
    /// Returns the memory capacity as NonZeroUsize, clamping to 1 if zero.
    pub fn memory_capacity_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.memory_capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_lifetimes() {
        let config = CacheConfig::default();
        assert_eq!(config.list_ttl, Duration::from_secs(60));
        assert_eq!(config.item_ttl, Duration::from_secs(300));
        assert_eq!(config.invalidation, InvalidationStrategy::Scan);
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let config = CacheConfig {
            memory_capacity: 0,
            ..Default::default()
        };
        assert_eq!(config.memory_capacity_non_zero().get(), 1);
    }

    #[test]
    fn strategy_parses_case_insensitively() {
        assert_eq!(
            InvalidationStrategy::parse(" Generation "),
            Some(InvalidationStrategy::Generation)
        );
        assert_eq!(InvalidationStrategy::parse("ttl"), None);
    }
}
