use chrono::NaiveDate;
use thiserror::Error;

use crate::providers::ProviderInitError;

/// The unified error type for the `health_ingestor` crate.
///
/// Upstream trouble (rate limits, rejected requests, malformed bodies) is not
/// an `Error`: it is reported per chunk inside the fetch result. This type is
/// reserved for problems that make the whole operation meaningless.
#[derive(Debug, Error)]
pub enum Error {
    /// A chunk span, retry policy or other setting is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A date range whose start lies after its end.
    #[error("Invalid date range: {start} is after {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// The configuration file could not be parsed.
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// The HTTP client could not be constructed.
    #[error("Provider initialization error: {0}")]
    ProviderInit(#[from] ProviderInitError),

    /// A generic I/O error.
    #[error("I/O error")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
