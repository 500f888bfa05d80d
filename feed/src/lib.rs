//! CNB Rates Feed
//!
//! Fetches the Czech National Bank daily fixing, parses its pipe-delimited
//! text format and serves processed publications.
//!
//! # Features
//!
//! - Header validation with a fixed list of accepted date layouts
//! - Row-level tolerance: malformed rows are dropped and recorded
//! - Post-processing that filters and orders rates by currency code
//! - HTTP feed client with timeout and retry with backoff
//! - Publication caching with configurable TTL
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cnb_rates_feed::{CnbFeedClient, CnbFeedConfig, RatesService, RatesServiceConfig};
//!
//! let client = Arc::new(CnbFeedClient::new(CnbFeedConfig::default())?);
//! let service = RatesService::new(client, RatesServiceConfig::default());
//!
//! let latest = service.latest().await?;
//! ```

pub mod parser;
pub mod processor;
pub mod format;
pub mod client;
pub mod cache;
pub mod service;

pub use parser::{parse, parse_report, FeedHeader, ParseReport, RowError, RowRejection};
pub use processor::process;
pub use format::format_feed;
pub use client::{CnbFeedClient, CnbFeedConfig, RateFeedClient, RetryPolicy};
#[cfg(any(test, feature = "test-utils"))]
pub use client::MockFeedClient;
pub use cache::{CacheKey, ResponseCache, ResponseCacheConfig};
pub use service::{RatesService, RatesServiceConfig};
