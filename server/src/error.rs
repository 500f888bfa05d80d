//! API error mapping.

use axum::{
    extract::rejection::QueryRejection,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use cnb_rates_common::RatesError;
use serde::Serialize;
use thiserror::Error;

/// Seconds a client is asked to wait before retrying a transient failure.
pub const RETRY_AFTER_SECS: u64 = 60;

/// Errors surfaced by the HTTP layer.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Rates(#[from] RatesError),
    #[error("{0}")]
    BadRequest(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    error: &'static str,
    message: String,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Rates(RatesError::DataNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Rates(RatesError::DataParsing { .. })
            | ApiError::Rates(RatesError::FeedUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            ApiError::Rates(e) => e.error_code(),
            ApiError::BadRequest(_) => "BAD_REQUEST",
        }
    }

    // Feed breakage reads as a temporary outage; the next publication fixes it.
    fn public_message(&self) -> String {
        match self {
            ApiError::Rates(RatesError::DataNotFound { date }) => {
                format!("No exchange rates published for {}", date)
            }
            ApiError::Rates(_) => {
                "Exchange rates are temporarily unavailable, please try again later".to_string()
            }
            ApiError::BadRequest(reason) => reason.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            code: status.as_u16(),
            error: self.error_code(),
            message: self.public_message(),
        });
        let mut response = (status, body).into_response();
        if matches!(&self, ApiError::Rates(e) if e.is_retryable()) {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, header::HeaderValue::from(RETRY_AFTER_SECS));
        }
        response
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
