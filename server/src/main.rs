//! CNB Rates Server Binary
//!
//! Serves the CNB daily fixing as JSON over HTTP.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cnb_rates_common::{constants, DurationExt};
use cnb_rates_feed::{CnbFeedClient, RatesService, RatesServiceConfig, ResponseCacheConfig};
use cnb_rates_server::{app_router, AppState, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::from_env();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting CNB rates server");

    if let Err(e) = config.validate() {
        error!(error = %e, "Invalid configuration");
        return Err(anyhow::anyhow!("Configuration error: {}", e));
    }

    let client = Arc::new(CnbFeedClient::new(config.feed.client_config())?);
    let service_config = RatesServiceConfig {
        cache: ResponseCacheConfig {
            latest_ttl: chrono::Duration::from_std(config.cache_ttl)?,
            ..Default::default()
        },
        ..Default::default()
    };
    let service = RatesService::new(client, service_config);
    let state = Arc::new(AppState::new(service, config.cache_ttl));

    // Sweep expired publications
    let cleanup_state = state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(constants::cache_cleanup_interval().as_std());
        loop {
            ticker.tick().await;
            cleanup_state.service.cleanup();
        }
    });

    let router = app_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;

    info!(
        listen_addr = %config.listen_addr,
        listen_port = %config.listen_port,
        feed_url = %config.feed.url,
        "Server running"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
                std::future::pending::<()>().await;
            }
            info!("Shutdown signal received");
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
