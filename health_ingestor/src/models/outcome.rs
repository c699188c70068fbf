//! Per-request outcomes and per-chunk failures.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{date_range::DateRange, record::RawRecord};

/// Classification of an upstream `errorType`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamErrorKind {
    /// `system`: the upstream's catch-all for overload and rate limiting.
    System,
    /// Explicit rate-limit markers.
    RateLimited,
    ExpiredToken,
    InvalidToken,
    InsufficientScope,
    Validation,
    NotFound,
    /// The client capability failed before a JSON body was available.
    Transport,
    Other(String),
}

impl UpstreamErrorKind {
    pub fn from_error_type(error_type: &str) -> Self {
        match error_type.trim().to_lowercase().as_str() {
            "system" => Self::System,
            "rate_limit" | "rate_limited" | "too_many_requests" => Self::RateLimited,
            "expired_token" => Self::ExpiredToken,
            "invalid_token" | "invalid_client" | "invalid_grant" => Self::InvalidToken,
            "insufficient_scope" | "insufficient_permissions" => Self::InsufficientScope,
            "validation" | "invalid_request" | "request" => Self::Validation,
            "not_found" => Self::NotFound,
            _ => Self::Other(error_type.to_string()),
        }
    }

    /// Whether a retry after backoff may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::System | Self::RateLimited)
    }
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::System => "system",
            Self::RateLimited => "rate_limited",
            Self::ExpiredToken => "expired_token",
            Self::InvalidToken => "invalid_token",
            Self::InsufficientScope => "insufficient_scope",
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Transport => "transport",
            Self::Other(other) => other,
        };
        f.write_str(s)
    }
}

/// Result of fetching one chunk.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome {
    Success(Vec<RawRecord>),
    /// Transient errors persisted through every attempt.
    RateLimited(String),
    /// A non-retryable error; returned on first sight.
    Fatal(UpstreamErrorKind, String),
}

impl ApiOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiOutcome::Success(_))
    }
}

/// A chunk whose outcome was not `Success`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkFailure {
    pub range: DateRange,
    pub kind: UpstreamErrorKind,
    pub message: String,
}

impl fmt::Display for ChunkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed ({}): {}", self.range, self.kind, self.message)
    }
}
