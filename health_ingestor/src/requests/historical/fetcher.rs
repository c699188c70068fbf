//! Single-chunk fetch with classification-driven retry.
//!
//! Each attempt issues one GET. A body without an `errors` envelope is a
//! success. A transient error (`system`, rate limits) is observed at warn
//! level and retried after `backoff_factor × 2^attempt`; any other error ends
//! the chunk immediately as [`ApiOutcome::Fatal`]. When every attempt came
//! back transient the chunk ends as [`ApiOutcome::RateLimited`], leaving the
//! caller to decide what exhaustion means.

use std::time::Duration;

use log::{Level, debug};

use crate::{
    errors::Error,
    models::{
        date_range::DateRange,
        metric::MetricDescriptor,
        outcome::{ApiOutcome, UpstreamErrorKind},
    },
    providers::fitbit_rest::response::{error_marker, extract_records},
    requests::historical::FetchContext,
};

/// Retry policy for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    pub backoff_factor: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_factor: Duration::from_secs(1),
        }
    }
}

impl RetryConfig {
    pub fn validate(&self) -> Result<(), Error> {
        if self.max_attempts == 0 {
            return Err(Error::InvalidConfig("max_attempts must be at least 1".into()));
        }
        Ok(())
    }

    /// Delay after the failed attempt with zero-based index `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = 2u32.saturating_pow(attempt);
        self.backoff_factor.saturating_mul(multiplier)
    }
}

/// Fetches `range` of `descriptor` through `ctx`, retrying transient errors.
pub async fn fetch(
    ctx: &FetchContext<'_>,
    descriptor: &MetricDescriptor,
    range: &DateRange,
    retry: &RetryConfig,
) -> ApiOutcome {
    let url = descriptor.url(&ctx.base_url, range);
    let attempts = retry.max_attempts.max(1);
    let mut last_message = String::new();

    for attempt in 0..attempts {
        let body = match ctx.client.get(&url).await {
            Ok(body) => body,
            Err(e) => return ApiOutcome::Fatal(UpstreamErrorKind::Transport, e.to_string()),
        };

        let Some(upstream) = error_marker(&body) else {
            return success(ctx, descriptor, range, &body);
        };

        let kind = UpstreamErrorKind::from_error_type(&upstream.error_type);
        if !kind.is_transient() {
            return ApiOutcome::Fatal(kind, upstream.message);
        }

        ctx.observer.emit(
            Level::Warn,
            &format!(
                "[{}] rate limit hit for {} {} (attempt {}/{}): {}",
                ctx.request_id,
                descriptor.kind,
                range,
                attempt + 1,
                attempts,
                upstream.message
            ),
        );
        last_message = upstream.message;

        if attempt + 1 < attempts {
            ctx.sleeper.sleep(retry.delay_for(attempt)).await;
        }
    }

    ApiOutcome::RateLimited(last_message)
}

fn success(
    ctx: &FetchContext<'_>,
    descriptor: &MetricDescriptor,
    range: &DateRange,
    body: &serde_json::Value,
) -> ApiOutcome {
    let extraction = extract_records(body, descriptor);
    if extraction.key_missing {
        ctx.observer.emit(
            Level::Warn,
            &format!(
                "[{}] response for {} {} has no `{}` key, treating chunk as empty",
                ctx.request_id, descriptor.kind, range, descriptor.success_key
            ),
        );
    }
    if extraction.skipped > 0 {
        debug!(
            "[{}] skipped {} entries without a usable `{}` in {range}",
            ctx.request_id, extraction.skipped, descriptor.date_key
        );
    }
    if extraction.merged > 0 {
        debug!(
            "[{}] folded {} entries into earlier ones of the same date ({:?}) in {range}",
            ctx.request_id, extraction.merged, descriptor.date_merge
        );
    }
    if extraction.truncated > 0 {
        debug!(
            "[{}] truncated {} sub-day timestamps to calendar dates in {range}",
            ctx.request_id, extraction.truncated
        );
    }
    ApiOutcome::Success(extraction.records)
}
