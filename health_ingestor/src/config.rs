//! TOML configuration for the ingestor.
//!
//! ```toml
//! [api]
//! base_url = "https://api.fitbit.com"
//! requests_per_hour = 150
//! timeout_secs = 30
//!
//! [fetch]
//! chunk_span = "1y"
//! max_attempts = 3
//! backoff_factor_ms = 1000
//! ```
//!
//! Every field is optional. The access token never lives in the file; it is
//! read from [`ACCESS_TOKEN_ENV`].

use std::{path::Path, time::Duration};

use log::error;
use nonzero_ext::nonzero;
use serde::{Deserialize, Serialize};

use crate::{
    errors::Error,
    models::date_range::ChunkSpan,
    requests::historical::fetcher::RetryConfig,
};

/// Environment variable holding the OAuth2 bearer token.
pub const ACCESS_TOKEN_ENV: &str = "FITBIT_ACCESS_TOKEN";

pub const DEFAULT_BASE_URL: &str = "https://api.fitbit.com";

/// The upstream's documented per-user hourly allowance.
pub const DEFAULT_REQUESTS_PER_HOUR: std::num::NonZeroU32 = nonzero!(150u32);

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub api: ApiConfig,
    pub fetch: FetchConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApiConfig {
    pub base_url: String,
    /// Client-side request quota; `None` disables throttling.
    pub requests_per_hour: Option<u32>,
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            requests_per_hour: Some(DEFAULT_REQUESTS_PER_HOUR.get()),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Overrides the per-metric maximum span when set.
    pub chunk_span: Option<ChunkSpan>,
    pub max_attempts: u32,
    pub backoff_factor_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let retry = RetryConfig::default();
        Self {
            chunk_span: None,
            max_attempts: retry.max_attempts,
            backoff_factor_ms: retry.backoff_factor.as_millis() as u64,
        }
    }
}

impl FetchConfig {
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            backoff_factor: Duration::from_millis(self.backoff_factor_ms),
        }
    }
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let config: Config = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).inspect_err(|e| {
            error!("Failed to read config file {}: {e}", path.display());
        })?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.api.base_url.trim().is_empty() {
            return Err(Error::InvalidConfig("api.base_url is empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(Error::InvalidConfig("api.timeout_secs must be positive".into()));
        }
        if let Some(span) = &self.fetch.chunk_span {
            span.validate()?;
        }
        self.fetch.retry().validate()
    }
}
