//! Authenticated access to the upstream health-data API.
//!
//! This module defines the [`AuthenticatedClient`] trait, the capability the
//! fetch engine consumes: issue one GET and hand back the parsed JSON body.
//! Token acquisition and refresh belong to whoever implements it; the engine
//! never sees credentials.
//!
//! The trait is designed for async usage and supports dynamic dispatch
//! (`dyn AuthenticatedClient`), so tests can swap in a scripted client.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use health_ingestor::providers::{AuthenticatedClient, ProviderError};
//! use serde_json::{json, Value};
//!
//! struct Canned;
//!
//! #[async_trait]
//! impl AuthenticatedClient for Canned {
//!     async fn get(&self, _url: &str) -> Result<Value, ProviderError> {
//!         Ok(json!({"activities-steps": []}))
//!     }
//! }
//! ```

pub mod fitbit_rest;

use async_trait::async_trait;
use serde_json::Value;
use shared_utils::env::MissingEnvVarError;
use snafu::{Backtrace, Snafu};

/// One authenticated GET against the upstream API.
///
/// Implementations return the decoded body whatever the HTTP status, because
/// the upstream reports rate limits and authorization problems in a JSON
/// `errors` envelope that the fetcher classifies.
#[async_trait]
pub trait AuthenticatedClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<Value, ProviderError>;
}

#[async_trait]
impl<C: AuthenticatedClient + ?Sized> AuthenticatedClient for std::sync::Arc<C> {
    async fn get(&self, url: &str) -> Result<Value, ProviderError> {
        (**self).get(url).await
    }
}

/// Errors that can occur during the creation of a client instance
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderInitError {
    /// missed environment variable.
    #[snafu(display("Missing environment variable: {source}"))]
    MissingEnvVar {
        source: MissingEnvVarError,
        backtrace: Backtrace,
    },

    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// Access token contains invalid header characters.
    #[snafu(display("Invalid access token format: {source}"))]
    InvalidToken {
        source: reqwest::header::InvalidHeaderValue,
        backtrace: Backtrace,
    },

    /// A request quota of zero.
    #[snafu(display("Invalid request quota: {message}"))]
    InvalidQuota {
        message: String,
        backtrace: Backtrace,
    },
}

/// Errors that can occur within an `AuthenticatedClient` implementation.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum ProviderError {
    /// An error during an API request (e.g., network failure, timeout).
    #[snafu(display("API request failed: {source}"))]
    Reqwest {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The response body was not JSON.
    #[snafu(display("Response from {url} is not valid JSON (HTTP {status}): {source}"))]
    Decode {
        url: String,
        status: u16,
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// An internal error occurred while processing data within the client.
    #[snafu(display("Internal client error: {message}"))]
    Internal {
        message: String,
        backtrace: Backtrace,
    },
}
