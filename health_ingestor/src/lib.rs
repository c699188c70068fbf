//! Resilient chunked retrieval and calendar aggregation of health metrics.
//!
//! The pipeline, leaves first:
//!
//! - [`planner`] splits a date range into chunks the upstream accepts,
//! - [`requests::historical::fetcher`] fetches one chunk with retry and backoff,
//! - [`assembler`] merges chunk outcomes, tolerating failed chunks,
//! - [`aggregator`] reduces the merged series to monthly or yearly means.
//!
//! [`requests::historical::fetch_series`] and
//! [`requests::historical::fetch_summary`] drive the whole pipeline.

#[cfg(feature = "cli")]
pub mod cli;
pub mod aggregator;
pub mod assembler;
pub mod config;
pub mod errors;
pub mod models;
pub mod observe;
pub mod planner;
pub mod providers;
pub mod requests;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use errors::{Error, Result};
