//! Server configuration.

use std::time::Duration;

use cnb_rates_common::{constants, DurationExt};
use cnb_rates_feed::client::DEFAULT_FEED_URL;
use cnb_rates_feed::{CnbFeedConfig, RetryPolicy};

/// Upstream feed configuration.
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Feed URL without query parameters.
    pub url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first failed request.
    pub max_retries: u32,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_FEED_URL.to_string(),
            timeout: constants::feed_request_timeout().as_std(),
            max_retries: RetryPolicy::default().max_retries,
        }
    }
}

impl FeedConfig {
    /// Build the feed client configuration.
    pub fn client_config(&self) -> CnbFeedConfig {
        CnbFeedConfig {
            base_url: self.url.clone(),
            timeout: self.timeout,
            retry: RetryPolicy {
                max_retries: self.max_retries,
                ..RetryPolicy::default()
            },
            ..CnbFeedConfig::default()
        }
    }
}

/// Main server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address.
    pub listen_addr: String,
    /// Listen port.
    pub listen_port: u16,
    /// Feed configuration.
    pub feed: FeedConfig,
    /// Origins allowed by CORS; `*` allows any.
    pub cors_allow_origins: Vec<String>,
    /// How long the latest publication is cached, also sent as `max-age`.
    pub cache_ttl: Duration,
    /// Log level.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0".to_string(),
            listen_port: 8080,
            feed: FeedConfig::default(),
            cors_allow_origins: vec!["*".to_string()],
            cache_ttl: constants::latest_cache_ttl().as_std(),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(addr) = lookup("CNB_LISTEN_ADDR") {
            config.listen_addr = addr;
        }

        if let Some(port) = lookup("CNB_LISTEN_PORT") {
            if let Ok(port) = port.parse() {
                config.listen_port = port;
            }
        }

        if let Some(url) = lookup("CNB_FEED_URL") {
            config.feed.url = url.trim().to_string();
        }

        if let Some(timeout) = lookup("CNB_FEED_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                config.feed.timeout = Duration::from_millis(ms);
            }
        }

        if let Some(retries) = lookup("CNB_FEED_MAX_RETRIES") {
            if let Ok(retries) = retries.parse() {
                config.feed.max_retries = retries;
            }
        }

        if let Some(origins) = lookup("CNB_CORS_ALLOW_ORIGINS") {
            config.cors_allow_origins = origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(ttl) = lookup("CNB_CACHE_TTL_SECS") {
            if let Ok(secs) = ttl.parse() {
                config.cache_ttl = Duration::from_secs(secs);
            }
        }

        if let Some(level) = lookup("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Socket address to bind.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.listen_port == 0 {
            return Err("Listen port cannot be 0".to_string());
        }

        if self.feed.url.is_empty() {
            return Err("Feed URL cannot be empty".to_string());
        }

        if !self.feed.url.starts_with("http://") && !self.feed.url.starts_with("https://") {
            return Err(format!("Feed URL must be http(s): {}", self.feed.url));
        }

        if self.feed.timeout.is_zero() {
            return Err("Feed timeout cannot be 0".to_string());
        }

        if self
            .cors_allow_origins
            .iter()
            .any(|o| o != "*" && o.parse::<axum::http::HeaderValue>().is_err())
        {
            return Err("CORS origins must be valid header values".to_string());
        }

        Ok(())
    }
}
