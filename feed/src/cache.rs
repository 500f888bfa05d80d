//! Publication caching with TTL support.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use cnb_rates_common::{constants, ExchangeRateResponse};
use dashmap::DashMap;
use tracing::debug;

/// Which publication an entry holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Whatever the feed currently serves as its latest publication.
    Latest,
    /// The publication for a specific date.
    Date(NaiveDate),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Latest => f.write_str("latest"),
            CacheKey::Date(date) => write!(f, "{}", date),
        }
    }
}

/// Cached publication entry.
#[derive(Debug, Clone)]
struct CacheEntry {
    response: ExchangeRateResponse,
    cached_at: DateTime<Utc>,
    ttl: Duration,
}

impl CacheEntry {
    fn new(response: ExchangeRateResponse, ttl: Duration) -> Self {
        Self {
            response,
            cached_at: Utc::now(),
            ttl,
        }
    }

    fn is_valid(&self) -> bool {
        Utc::now().signed_duration_since(self.cached_at) < self.ttl
    }
}

/// Configuration for the response cache.
#[derive(Debug, Clone)]
pub struct ResponseCacheConfig {
    /// TTL for the latest publication.
    pub latest_ttl: Duration,
    /// TTL for dated publications, which never change once published.
    pub historical_ttl: Duration,
    /// Maximum number of entries.
    pub max_entries: usize,
}

impl Default for ResponseCacheConfig {
    fn default() -> Self {
        Self {
            latest_ttl: constants::latest_cache_ttl(),
            historical_ttl: constants::historical_cache_ttl(),
            max_entries: 1000,
        }
    }
}

/// Thread-safe publication cache with TTL.
pub struct ResponseCache {
    cache: DashMap<CacheKey, CacheEntry>,
    config: ResponseCacheConfig,
}

impl ResponseCache {
    /// Create a new cache with default configuration.
    pub fn new() -> Self {
        Self::with_config(ResponseCacheConfig::default())
    }

    /// Create a new cache with custom configuration.
    pub fn with_config(config: ResponseCacheConfig) -> Self {
        Self {
            cache: DashMap::new(),
            config,
        }
    }

    /// Get a publication if cached and not expired.
    pub fn get(&self, key: CacheKey) -> Option<ExchangeRateResponse> {
        if let Some(entry) = self.cache.get(&key) {
            if entry.is_valid() {
                debug!(key = %key, "Cache hit");
                return Some(entry.response.clone());
            }
            debug!(key = %key, "Cache entry expired");
            drop(entry);
            self.cache.remove(&key);
        }

        debug!(key = %key, "Cache miss");
        None
    }

    /// Insert a publication with the TTL configured for its key.
    pub fn insert(&self, key: CacheKey, response: ExchangeRateResponse) {
        let ttl = match key {
            CacheKey::Latest => self.config.latest_ttl,
            CacheKey::Date(_) => self.config.historical_ttl,
        };
        self.insert_with_ttl(key, response, ttl);
    }

    /// Insert a publication with custom TTL.
    pub fn insert_with_ttl(&self, key: CacheKey, response: ExchangeRateResponse, ttl: Duration) {
        if self.cache.len() >= self.config.max_entries && !self.cache.contains_key(&key) {
            self.evict_expired();
            if self.cache.len() >= self.config.max_entries {
                self.evict_oldest();
            }
        }

        self.cache.insert(key, CacheEntry::new(response, ttl));
    }

    /// Get the number of entries in cache.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Check if cache is empty.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    /// Evict expired entries.
    pub fn evict_expired(&self) {
        self.cache.retain(|_, entry| entry.is_valid());
    }

    /// Get cache statistics.
    pub fn stats(&self) -> CacheStats {
        let total = self.cache.len();
        let valid = self.cache.iter().filter(|e| e.is_valid()).count();

        CacheStats {
            total_entries: total,
            valid_entries: valid,
            expired_entries: total - valid,
        }
    }

    fn evict_oldest(&self) {
        let oldest = self
            .cache
            .iter()
            .min_by_key(|e| e.cached_at)
            .map(|e| *e.key());
        if let Some(key) = oldest {
            self.cache.remove(&key);
        }
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Cache statistics.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub total_entries: usize,
    pub valid_entries: usize,
    pub expired_entries: usize,
}
