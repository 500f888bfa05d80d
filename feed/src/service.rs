//! Rate service: fetch, parse, process and cache publications.

use std::sync::Arc;

use chrono::NaiveDate;
use cnb_rates_common::{ExchangeRateResponse, RatesError, RatesResult};
use tracing::{debug, info, instrument, warn};

use crate::cache::{CacheKey, CacheStats, ResponseCache, ResponseCacheConfig};
use crate::client::RateFeedClient;
use crate::parser::parse_report;
use crate::processor::process;

/// Configuration for the rates service.
#[derive(Debug, Clone)]
pub struct RatesServiceConfig {
    /// Cache configuration.
    pub cache: ResponseCacheConfig,
    /// Whether to use cached publications.
    pub use_cache: bool,
}

impl Default for RatesServiceConfig {
    fn default() -> Self {
        Self {
            cache: ResponseCacheConfig::default(),
            use_cache: true,
        }
    }
}

/// The rates service.
pub struct RatesService {
    client: Arc<dyn RateFeedClient>,
    cache: ResponseCache,
    config: RatesServiceConfig,
}

impl RatesService {
    /// Create a new service backed by the given feed client.
    pub fn new(client: Arc<dyn RateFeedClient>, config: RatesServiceConfig) -> Self {
        Self {
            client,
            cache: ResponseCache::with_config(config.cache.clone()),
            config,
        }
    }

    /// Get the latest publication.
    #[instrument(skip(self))]
    pub async fn latest(&self) -> RatesResult<ExchangeRateResponse> {
        self.load(CacheKey::Latest).await
    }

    /// Get the publication for a specific date.
    #[instrument(skip(self), fields(date = %date))]
    pub async fn for_date(&self, date: NaiveDate) -> RatesResult<ExchangeRateResponse> {
        self.load(CacheKey::Date(date)).await
    }

    /// Get cache statistics.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop expired cache entries.
    pub fn cleanup(&self) {
        self.cache.evict_expired();
    }

    async fn load(&self, key: CacheKey) -> RatesResult<ExchangeRateResponse> {
        if self.config.use_cache {
            if let Some(cached) = self.cache.get(key) {
                debug!("Using cached publication");
                return Ok(cached);
            }
        }

        let requested = match key {
            CacheKey::Latest => None,
            CacheKey::Date(date) => Some(date),
        };

        let raw = self.client.fetch(requested).await?;
        let report = parse_report(Some(raw.as_str())).inspect_err(|e| {
            warn!(client = self.client.name(), error = %e, "Feed could not be parsed");
        })?;

        // The feed answers an unpublished date with its latest publication.
        if let Some(date) = requested {
            if report.response.date != date {
                debug!(published = %report.response.date, "Feed has no publication for date");
                return Err(RatesError::DataNotFound { date });
            }
        }

        let response = process(report.response);

        info!(
            client = self.client.name(),
            date = %response.date,
            sequence = response.sequence_number,
            rows = response.len(),
            rejected = report.rejected.len(),
            "Loaded publication"
        );

        if self.config.use_cache {
            self.cache.insert(key, response.clone());
        }

        Ok(response)
    }
}
