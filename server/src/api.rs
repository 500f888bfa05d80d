//! HTTP routes.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderValue, Method},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use cnb_rates_feed::RatesService;
use serde::{Deserialize, Serialize};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

use crate::config::ServerConfig;
use crate::error::{ApiError, ApiResult};
use crate::metrics::{Metrics, MetricsSnapshot};

/// Shared state behind every handler.
pub struct AppState {
    pub service: RatesService,
    pub metrics: Metrics,
    /// `max-age` sent with successful rate responses.
    pub cache_max_age: Duration,
}

impl AppState {
    pub fn new(service: RatesService, cache_max_age: Duration) -> Self {
        Self {
            service,
            metrics: Metrics::new(),
            cache_max_age,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RatesQuery {
    date: Option<String>,
}

fn parse_date_param(raw: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ApiError::BadRequest(format!("Invalid date '{}', expected YYYY-MM-DD", raw))
    })
}

async fn get_exchange_rates(
    State(state): State<Arc<AppState>>,
    query: Result<Query<RatesQuery>, QueryRejection>,
) -> ApiResult<Response> {
    state.metrics.request_received();

    let Query(query) = query.map_err(|rejection| {
        state.metrics.bad_request();
        ApiError::from(rejection)
    })?;

    let date = match query.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => Some(parse_date_param(raw).inspect_err(|_| state.metrics.bad_request())?),
        None => None,
    };

    let result = match date {
        Some(date) => state.service.for_date(date).await,
        None => state.service.latest().await,
    };

    let response = result.map_err(|e| {
        warn!(error = %e, code = e.error_code(), "Rate request failed");
        state.metrics.request_failed(&e);
        ApiError::from(e)
    })?;

    state.metrics.request_success();
    let cache_control = format!("public, max-age={}", state.cache_max_age.as_secs());
    Ok(([(header::CACHE_CONTROL, cache_control)], Json(response)).into_response())
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    metrics: MetricsSnapshot,
}

async fn healthz(State(state): State<Arc<AppState>>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        metrics: state.metrics.snapshot(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.to_prometheus(),
    )
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods([Method::GET]);
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}

/// Build the application router.
pub fn app_router(state: Arc<AppState>, config: &ServerConfig) -> Router {
    let api = Router::new().route("/exchange-rates", get(get_exchange_rates));

    Router::new()
        .nest("/api/v1", api)
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(state)
        .layer(cors_layer(&config.cors_allow_origins))
        .layer(TraceLayer::new_for_http())
}
