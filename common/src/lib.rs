//! CNB Rates Common Types
//!
//! This crate contains the types shared across the CNB rates service:
//! exchange-rate records, the published response snapshot, the error
//! taxonomy, and date helpers for the feed format.

pub mod rates;
pub mod error;
pub mod time;

pub use rates::*;
pub use error::*;
pub use time::*;
