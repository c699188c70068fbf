use chrono::{Months, NaiveDate};

use crate::{
    config::Config,
    errors::Error,
    models::{
        date_range::ChunkSpan,
        metric::{MetricKind, MetricRegistry},
    },
    requests::historical::{FetchRequest, RetryConfig},
};

use super::commands::RangeArgs;

pub fn parse_date(s: &str) -> Result<NaiveDate, Error> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| Error::InvalidConfig(format!("invalid date {s:?}: {e}")))
}

/// Builds a request from command-line arguments, falling back to `config`.
///
/// Without `--start` the range covers the year up to `--end` (or `today`).
pub fn build_request(
    args: &RangeArgs,
    config: &Config,
    registry: &MetricRegistry,
    today: NaiveDate,
) -> Result<FetchRequest, Error> {
    let kind: MetricKind = args.metric.parse()?;
    let descriptor = registry.descriptor(kind)?.clone();

    let end = args.end.as_deref().map(parse_date).transpose()?.unwrap_or(today);
    let start = match args.start.as_deref() {
        Some(s) => parse_date(s)?,
        None => end
            .checked_sub_months(Months::new(12))
            .ok_or_else(|| Error::InvalidConfig(format!("no default start before {end}")))?,
    };

    let chunk_span = match args.chunk_span.as_deref() {
        Some(s) => Some(s.parse::<ChunkSpan>()?),
        None => config.fetch.chunk_span,
    };

    let defaults = config.fetch.retry();
    let retry = RetryConfig {
        max_attempts: args.max_attempts.unwrap_or(defaults.max_attempts),
        backoff_factor: args
            .backoff_ms
            .map(std::time::Duration::from_millis)
            .unwrap_or(defaults.backoff_factor),
    };
    retry.validate()?;

    let mut request = FetchRequest::new(descriptor, start, end).with_retry(retry);
    if let Some(span) = chunk_span {
        span.validate()?;
        request = request.with_chunk_span(span);
    }
    Ok(request)
}
