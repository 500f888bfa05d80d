//! CNB Rates Server
//!
//! Republishes the CNB daily fixing as JSON for the browser table view.
//! Routes live in [`api`], status mapping for feed failures in [`error`].

pub mod api;
pub mod config;
pub mod error;
pub mod metrics;

pub use api::{app_router, AppState};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
