//! Date helpers and timing constants for the CNB feed.

use chrono::{Duration, NaiveDate};

/// Service timing constants.
pub mod constants {
    use super::Duration;

    /// How long the latest publication is cached (5 minutes).
    pub fn latest_cache_ttl() -> Duration {
        Duration::minutes(5)
    }

    /// How long a historical publication is cached (24 hours).
    pub fn historical_cache_ttl() -> Duration {
        Duration::hours(24)
    }

    /// Feed request timeout (10 seconds).
    pub fn feed_request_timeout() -> Duration {
        Duration::seconds(10)
    }

    /// First retry delay for feed requests (500 milliseconds).
    pub fn feed_retry_base_delay() -> Duration {
        Duration::milliseconds(500)
    }

    /// Longest retry delay for feed requests (5 seconds).
    pub fn feed_retry_max_delay() -> Duration {
        Duration::seconds(5)
    }

    /// How often expired cache entries are swept (1 minute).
    pub fn cache_cleanup_interval() -> Duration {
        Duration::minutes(1)
    }
}

/// Date layout used by the `date` query parameter of the feed.
pub const QUERY_DATE_FORMAT: &str = "%d.%m.%Y";

/// Date layout written in feed header lines.
pub const HEADER_DATE_FORMAT: &str = "%d %b %Y";

/// Format a date for the feed's `date` query parameter.
pub fn format_query_date(date: NaiveDate) -> String {
    date.format(QUERY_DATE_FORMAT).to_string()
}

/// Format a date the way the feed header writes it.
pub fn format_header_date(date: NaiveDate) -> String {
    date.format(HEADER_DATE_FORMAT).to_string()
}

/// Duration extensions for convenient conversion.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_query_date() {
        let date = NaiveDate::from_ymd_opt(2000, 1, 3).unwrap();
        assert_eq!(format_query_date(date), "03.01.2000");
    }

    #[test]
    fn test_format_header_date() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(format_header_date(date), "15 Jan 2024");
    }

    #[test]
    fn test_negative_duration_as_std() {
        assert_eq!(Duration::seconds(-5).as_std(), std::time::Duration::ZERO);
        assert_eq!(constants::feed_request_timeout().as_std().as_secs(), 10);
    }
}
