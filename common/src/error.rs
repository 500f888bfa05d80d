//! Error types for the CNB rates service.

use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for rate retrieval and parsing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RatesError {
    /// The feed could not be turned into a usable publication.
    #[error("Data parsing failed: {reason}")]
    DataParsing {
        reason: String,
        /// Per-row rejection reasons, when the batch failed because of them.
        row_errors: Vec<String>,
    },

    /// The upstream feed has no publication for the requested date.
    #[error("No exchange rate data for {date}")]
    DataNotFound { date: NaiveDate },

    /// The upstream feed could not be reached.
    #[error("Rate feed unavailable: {0}")]
    FeedUnavailable(String),
}

impl RatesError {
    /// Create a parsing error without row detail.
    pub fn parsing(reason: impl Into<String>) -> Self {
        RatesError::DataParsing {
            reason: reason.into(),
            row_errors: Vec::new(),
        }
    }

    /// Create a parsing error carrying the collected row failures.
    pub fn parsing_with_rows(reason: impl Into<String>, row_errors: Vec<String>) -> Self {
        RatesError::DataParsing {
            reason: reason.into(),
            row_errors,
        }
    }

    /// Parsing reason, if this is a parsing error.
    pub fn reason(&self) -> Option<&str> {
        match self {
            RatesError::DataParsing { reason, .. } => Some(reason),
            _ => None,
        }
    }

    /// Check if retrying later may succeed.
    ///
    /// A broken publication is replaced by the next one, so parsing failures
    /// count as transient.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RatesError::DataParsing { .. } | RatesError::FeedUnavailable(_)
        )
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            RatesError::DataParsing { .. } => "DATA_PARSING_ERROR",
            RatesError::DataNotFound { .. } => "DATA_NOT_FOUND",
            RatesError::FeedUnavailable(_) => "FEED_UNAVAILABLE",
        }
    }
}

/// Result type alias for rate operations.
pub type RatesResult<T> = std::result::Result<T, RatesError>;
