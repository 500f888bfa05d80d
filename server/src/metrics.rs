//! Request metrics for server monitoring.

use std::sync::atomic::{AtomicU64, Ordering};

use cnb_rates_common::RatesError;
use serde::Serialize;

/// Server metrics.
pub struct Metrics {
    /// Total rate requests received.
    pub requests_total: AtomicU64,
    /// Rate requests answered with data.
    pub requests_success: AtomicU64,
    /// Requests rejected for bad parameters.
    pub bad_requests: AtomicU64,
    /// Requests for dates the feed has no publication for.
    pub not_found: AtomicU64,
    /// Requests that failed because the feed could not be parsed.
    pub parse_failures: AtomicU64,
    /// Requests that failed because the feed could not be reached.
    pub feed_failures: AtomicU64,
}

impl Metrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            requests_total: AtomicU64::new(0),
            requests_success: AtomicU64::new(0),
            bad_requests: AtomicU64::new(0),
            not_found: AtomicU64::new(0),
            parse_failures: AtomicU64::new(0),
            feed_failures: AtomicU64::new(0),
        }
    }

    /// Increment requests received.
    pub fn request_received(&self) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful request.
    pub fn request_success(&self) {
        self.requests_success.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a request rejected for bad parameters.
    pub fn bad_request(&self) {
        self.bad_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed request by error kind.
    pub fn request_failed(&self, error: &RatesError) {
        let counter = match error {
            RatesError::DataParsing { .. } => &self.parse_failures,
            RatesError::DataNotFound { .. } => &self.not_found,
            RatesError::FeedUnavailable(_) => &self.feed_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            requests_success: self.requests_success.load(Ordering::Relaxed),
            bad_requests: self.bad_requests.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            feed_failures: self.feed_failures.load(Ordering::Relaxed),
        }
    }

    /// Export metrics in Prometheus format.
    pub fn to_prometheus(&self) -> String {
        let snapshot = self.snapshot();
        format!(
            r#"# HELP cnb_rates_requests_total Total number of rate requests
# TYPE cnb_rates_requests_total counter
cnb_rates_requests_total {}

# HELP cnb_rates_requests_success Rate requests answered with data
# TYPE cnb_rates_requests_success counter
cnb_rates_requests_success {}

# HELP cnb_rates_bad_requests Rate requests with invalid parameters
# TYPE cnb_rates_bad_requests counter
cnb_rates_bad_requests {}

# HELP cnb_rates_not_found Rate requests for dates without a publication
# TYPE cnb_rates_not_found counter
cnb_rates_not_found {}

# HELP cnb_rates_parse_failures Rate requests failed by an unparseable feed
# TYPE cnb_rates_parse_failures counter
cnb_rates_parse_failures {}

# HELP cnb_rates_feed_failures Rate requests failed by an unreachable feed
# TYPE cnb_rates_feed_failures counter
cnb_rates_feed_failures {}
"#,
            snapshot.requests_total,
            snapshot.requests_success,
            snapshot.bad_requests,
            snapshot.not_found,
            snapshot.parse_failures,
            snapshot.feed_failures,
        )
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub requests_success: u64,
    pub bad_requests: u64,
    pub not_found: u64,
    pub parse_failures: u64,
    pub feed_failures: u64,
}
