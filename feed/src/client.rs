//! Feed client trait and the HTTP client for the CNB daily fixing.

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use cnb_rates_common::{constants, format_query_date, DurationExt, RatesError, RatesResult};
use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

/// Default location of the daily fixing text feed.
pub const DEFAULT_FEED_URL: &str = "https://www.cnb.cz/en/financial-markets/foreign-exchange-market/central-bank-exchange-rate-fixing/central-bank-exchange-rate-fixing/daily.txt";

/// Trait for sources of raw feed text.
#[async_trait]
pub trait RateFeedClient: Send + Sync {
    /// Get the client name.
    fn name(&self) -> &str;

    /// Fetch the raw publication, the latest one when `date` is `None`.
    async fn fetch(&self, date: Option<NaiveDate>) -> RatesResult<String>;
}

/// Retry schedule for feed requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Upper bound for any delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: constants::feed_retry_base_delay().as_std(),
            max_delay: constants::feed_retry_max_delay().as_std(),
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Delay before retry number `attempt` (0-based), doubling each time.
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// Check if an HTTP status is worth retrying.
    pub fn should_retry_status(status: StatusCode) -> bool {
        status.is_server_error()
            || status == StatusCode::REQUEST_TIMEOUT
            || status == StatusCode::TOO_MANY_REQUESTS
    }
}

/// Configuration for [`CnbFeedClient`].
#[derive(Debug, Clone)]
pub struct CnbFeedConfig {
    /// Feed URL without query parameters.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retry schedule.
    pub retry: RetryPolicy,
    /// User agent sent with each request.
    pub user_agent: String,
}

impl Default for CnbFeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_FEED_URL.to_string(),
            timeout: constants::feed_request_timeout().as_std(),
            retry: RetryPolicy::default(),
            user_agent: concat!("cnb-rates/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// Outcome of a single failed attempt.
#[derive(Debug)]
enum AttemptError {
    Retryable(String),
    NotFound,
    Fatal(String),
}

/// HTTP client for the CNB text feed.
pub struct CnbFeedClient {
    http: reqwest::Client,
    config: CnbFeedConfig,
}

impl CnbFeedClient {
    /// Create a new client.
    pub fn new(config: CnbFeedConfig) -> RatesResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| RatesError::FeedUnavailable(format!("cannot build HTTP client: {e}")))?;

        Ok(Self { http, config })
    }

    /// URL requested for the given date.
    pub fn request_url(&self, date: Option<NaiveDate>) -> String {
        match date {
            Some(date) => format!("{}?date={}", self.config.base_url, format_query_date(date)),
            None => self.config.base_url.clone(),
        }
    }

    async fn attempt(&self, url: &str) -> Result<String, AttemptError> {
        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() || e.is_connect() || e.is_request() {
                AttemptError::Retryable(e.to_string())
            } else {
                AttemptError::Fatal(e.to_string())
            }
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(AttemptError::NotFound);
        }
        if RetryPolicy::should_retry_status(status) {
            return Err(AttemptError::Retryable(format!("upstream returned {status}")));
        }
        if !status.is_success() {
            return Err(AttemptError::Fatal(format!("upstream returned {status}")));
        }

        response
            .text()
            .await
            .map_err(|e| AttemptError::Retryable(e.to_string()))
    }
}

#[async_trait]
impl RateFeedClient for CnbFeedClient {
    fn name(&self) -> &str {
        "CNB"
    }

    #[instrument(skip(self), fields(client = "CNB"))]
    async fn fetch(&self, date: Option<NaiveDate>) -> RatesResult<String> {
        let url = self.request_url(date);
        let retry = self.config.retry;
        let mut last_error = String::new();

        for attempt in 0..=retry.max_retries {
            match self.attempt(&url).await {
                Ok(body) => {
                    debug!(attempt, bytes = body.len(), "Fetched feed");
                    return Ok(body);
                }
                Err(AttemptError::NotFound) => {
                    return Err(match date {
                        Some(date) => RatesError::DataNotFound { date },
                        None => RatesError::FeedUnavailable("latest feed not found".to_string()),
                    });
                }
                Err(AttemptError::Fatal(message)) => {
                    warn!(error = %message, "Feed request failed");
                    return Err(RatesError::FeedUnavailable(message));
                }
                Err(AttemptError::Retryable(message)) => {
                    if attempt < retry.max_retries {
                        let delay = retry.delay(attempt);
                        warn!(
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %message,
                            "Feed request failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                    }
                    last_error = message;
                }
            }
        }

        warn!(error = %last_error, "Feed retries exhausted");
        Err(RatesError::FeedUnavailable(last_error))
    }
}

/// Mock feed client for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockFeedClient {
    name: String,
    feeds: dashmap::DashMap<Option<NaiveDate>, String>,
    failure: parking_lot::Mutex<Option<RatesError>>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockFeedClient {
    /// Create a new mock client.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            feeds: dashmap::DashMap::new(),
            failure: parking_lot::Mutex::new(None),
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Serve `text` as the latest publication.
    pub fn set_latest(&self, text: impl Into<String>) {
        self.feeds.insert(None, text.into());
    }

    /// Serve `text` for requests naming `date`.
    pub fn set_for_date(&self, date: NaiveDate, text: impl Into<String>) {
        self.feeds.insert(Some(date), text.into());
    }

    /// Fail every following fetch with `error`.
    pub fn fail_with(&self, error: RatesError) {
        *self.failure.lock() = Some(error);
    }

    /// Number of fetches served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateFeedClient for MockFeedClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, date: Option<NaiveDate>) -> RatesResult<String> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        let failure = self.failure.lock().clone();
        if let Some(error) = failure {
            return Err(error);
        }

        self.feeds
            .get(&date)
            .map(|text| text.clone())
            .ok_or_else(|| match date {
                Some(date) => RatesError::DataNotFound { date },
                None => RatesError::FeedUnavailable("no latest feed configured".to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_retry_delay_doubles_and_caps() {
        let policy = RetryPolicy {
            max_retries: 5,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_millis(500),
        };

        assert_eq!(policy.delay(0), Duration::from_millis(100));
        assert_eq!(policy.delay(1), Duration::from_millis(200));
        assert_eq!(policy.delay(2), Duration::from_millis(400));
        assert_eq!(policy.delay(3), Duration::from_millis(500));
        assert_eq!(policy.delay(40), Duration::from_millis(500));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(RetryPolicy::should_retry_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(RetryPolicy::should_retry_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(RetryPolicy::should_retry_status(StatusCode::REQUEST_TIMEOUT));
        assert!(!RetryPolicy::should_retry_status(StatusCode::NOT_FOUND));
        assert!(!RetryPolicy::should_retry_status(StatusCode::BAD_REQUEST));
    }

    #[test]
    fn test_request_url() {
        let client = CnbFeedClient::new(CnbFeedConfig {
            base_url: "http://localhost/daily.txt".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(client.request_url(None), "http://localhost/daily.txt");
        assert_eq!(
            client.request_url(Some(ymd(2024, 1, 5))),
            "http://localhost/daily.txt?date=05.01.2024"
        );
    }

    #[tokio::test]
    async fn test_unreachable_feed_exhausts_retries() {
        let client = CnbFeedClient::new(CnbFeedConfig {
            base_url: "http://127.0.0.1:9/daily.txt".to_string(),
            timeout: Duration::from_millis(200),
            retry: RetryPolicy {
                max_retries: 1,
                base_delay: Duration::from_millis(1),
                max_delay: Duration::from_millis(1),
            },
            ..Default::default()
        })
        .unwrap();

        let result = client.fetch(None).await;

        assert!(matches!(result, Err(RatesError::FeedUnavailable(_))));
    }

    #[tokio::test]
    async fn test_mock_client() {
        let client = MockFeedClient::new("mock");
        client.set_latest("latest");
        client.set_for_date(ymd(2024, 1, 5), "dated");

        assert_eq!(client.fetch(None).await.unwrap(), "latest");
        assert_eq!(client.fetch(Some(ymd(2024, 1, 5))).await.unwrap(), "dated");
        assert_eq!(
            client.fetch(Some(ymd(1990, 1, 1))).await,
            Err(RatesError::DataNotFound { date: ymd(1990, 1, 1) })
        );
        assert_eq!(client.calls(), 3);

        client.fail_with(RatesError::FeedUnavailable("down".into()));
        assert!(client.fetch(None).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_failure_survives_panicked_holder() {
        let client = std::sync::Arc::new(MockFeedClient::new("mock"));
        client.set_latest("latest");

        let holder = client.clone();
        let panicked = std::thread::spawn(move || {
            let _guard = holder.failure.lock();
            panic!("holder panicked");
        })
        .join();
        assert!(panicked.is_err());

        client.fail_with(RatesError::FeedUnavailable("down".into()));

        assert_eq!(
            client.fetch(None).await,
            Err(RatesError::FeedUnavailable("down".into()))
        );
    }
}
