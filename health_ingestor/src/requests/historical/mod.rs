//! Chunked historical fetches: plan, fetch sequentially, assemble, aggregate.
//!
//! [`fetch_series`] returns the merged daily series; [`fetch_summary`] goes on
//! to monthly and yearly means. Both run one chunk at a time, in order, and
//! check the cancellation token before each chunk. Upstream failures never
//! abort the run: they are listed in the report, and only a run that ends
//! with nothing to report (zero records, or for a summary zero values) is
//! reported as [`FetchResult::NoDataFound`].

pub mod fetcher;
pub mod sleeper;

use chrono::NaiveDate;
use log::{Level, debug, info};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{
    aggregator::aggregate,
    assembler::combine,
    errors::Error,
    models::{
        bucket::{Bucket, Granularity},
        date_range::{ChunkSpan, DateRange},
        metric::{MetricDescriptor, MetricKind},
        outcome::{ApiOutcome, ChunkFailure},
        record::TimeSeries,
    },
    observe::{LogObserver, Observer},
    planner::plan,
    providers::AuthenticatedClient,
};

pub use fetcher::{RetryConfig, fetch};
pub use sleeper::{Sleeper, TokioSleeper};

/// Everything one operation needs to talk to the upstream.
///
/// Built per invocation; nothing in it is shared across operations.
pub struct FetchContext<'a> {
    pub client: &'a dyn AuthenticatedClient,
    pub base_url: String,
    pub observer: &'a dyn Observer,
    pub sleeper: &'a dyn Sleeper,
    pub request_id: Uuid,
}

impl<'a> FetchContext<'a> {
    /// Context with a fresh request id, `log` observations and tokio sleeps.
    pub fn new(client: &'a dyn AuthenticatedClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            observer: &LogObserver,
            sleeper: &TokioSleeper,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn with_observer(mut self, observer: &'a dyn Observer) -> Self {
        self.observer = observer;
        self
    }

    pub fn with_sleeper(mut self, sleeper: &'a dyn Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

}

/// What to fetch.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub metric: MetricDescriptor,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Falls back to the metric's own maximum span.
    pub chunk_span: Option<ChunkSpan>,
    pub retry: RetryConfig,
}

impl FetchRequest {
    pub fn new(metric: MetricDescriptor, start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            metric,
            start,
            end,
            chunk_span: None,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_chunk_span(mut self, span: ChunkSpan) -> Self {
        self.chunk_span = Some(span);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn effective_span(&self) -> ChunkSpan {
        self.chunk_span.unwrap_or(self.metric.max_span)
    }
}

/// Either data, or an explicit statement that the whole range came back empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchResult<T> {
    Data(T),
    NoDataFound {
        failures: Vec<ChunkFailure>,
        cancelled: bool,
    },
}

impl<T> FetchResult<T> {
    pub fn data(self) -> Option<T> {
        match self {
            FetchResult::Data(data) => Some(data),
            FetchResult::NoDataFound { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesReport {
    pub request_id: Uuid,
    pub metric: MetricKind,
    pub range: DateRange,
    pub series: TimeSeries,
    pub failures: Vec<ChunkFailure>,
    /// Set when cancellation stopped the run before the last chunk.
    pub cancelled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryReport {
    pub request_id: Uuid,
    pub metric: MetricKind,
    pub range: DateRange,
    pub monthly: Vec<Bucket>,
    pub yearly: Vec<Bucket>,
    pub failures: Vec<ChunkFailure>,
    pub cancelled: bool,
}

/// Common view of the two report shapes.
pub trait ChunkReport {
    fn failures(&self) -> &[ChunkFailure];
    fn cancelled(&self) -> bool;
}

impl ChunkReport for SeriesReport {
    fn failures(&self) -> &[ChunkFailure] {
        &self.failures
    }

    fn cancelled(&self) -> bool {
        self.cancelled
    }
}

impl ChunkReport for SummaryReport {
    fn failures(&self) -> &[ChunkFailure] {
        &self.failures
    }

    fn cancelled(&self) -> bool {
        self.cancelled
    }
}

/// Fetches the merged daily series for `request`.
///
/// `Err` is reserved for an unusable request (inverted range, bad span or
/// retry policy); upstream problems are reported per chunk.
pub async fn fetch_series(
    ctx: &FetchContext<'_>,
    request: &FetchRequest,
    cancel: &CancellationToken,
) -> Result<FetchResult<SeriesReport>, Error> {
    let range = DateRange::new(request.start, request.end)?;
    request.retry.validate()?;
    let chunks = plan(range.start, range.end, request.effective_span())?;
    info!(
        "[{}] fetching {} for {} in {} chunk(s) of at most {}",
        ctx.request_id,
        request.metric.kind,
        range,
        chunks.len(),
        request.effective_span()
    );

    let total = chunks.len();
    let mut outcomes: Vec<(DateRange, ApiOutcome)> = Vec::with_capacity(total);
    let mut cancelled = false;
    for (index, chunk) in chunks.into_iter().enumerate() {
        if cancel.is_cancelled() {
            cancelled = true;
            ctx.observer.emit(
                Level::Warn,
                &format!(
                    "[{}] cancelled before chunk {}/{total} ({chunk}); {} chunk(s) not fetched",
                    ctx.request_id,
                    index + 1,
                    total - index
                ),
            );
            break;
        }

        debug!("[{}] chunk {}/{total}: {chunk}", ctx.request_id, index + 1);
        let outcome = fetch(ctx, &request.metric, &chunk, &request.retry).await;
        match &outcome {
            ApiOutcome::Success(_) => {}
            ApiOutcome::RateLimited(message) => ctx.observer.emit(
                Level::Error,
                &format!(
                    "[{}] {chunk} still rate limited after {} attempt(s): {message}",
                    ctx.request_id, request.retry.max_attempts
                ),
            ),
            ApiOutcome::Fatal(kind, message) => ctx.observer.emit(
                Level::Error,
                &format!("[{}] {chunk} failed ({kind}): {message}", ctx.request_id),
            ),
        }
        outcomes.push((chunk, outcome));
    }

    let (series, failures) = combine(outcomes, ctx.observer);
    if series.is_empty() {
        ctx.observer.emit(
            Level::Error,
            &format!(
                "[{}] no {} data found for {range} ({} failed chunk(s))",
                ctx.request_id,
                request.metric.kind,
                failures.len()
            ),
        );
        return Ok(FetchResult::NoDataFound { failures, cancelled });
    }

    Ok(FetchResult::Data(SeriesReport {
        request_id: ctx.request_id,
        metric: request.metric.kind,
        range,
        series,
        failures,
        cancelled,
    }))
}

/// Fetches the series for `request` and reduces it to monthly and yearly means.
///
/// Unlike [`fetch_series`], a series whose days all lack a value is
/// [`FetchResult::NoDataFound`] here.
pub async fn fetch_summary(
    ctx: &FetchContext<'_>,
    request: &FetchRequest,
    cancel: &CancellationToken,
) -> Result<FetchResult<SummaryReport>, Error> {
    let report = match fetch_series(ctx, request, cancel).await? {
        FetchResult::Data(report) => report,
        FetchResult::NoDataFound { failures, cancelled } => {
            return Ok(FetchResult::NoDataFound { failures, cancelled });
        }
    };

    // a series of valueless days has no means to report
    if report.series.valued_len() == 0 {
        ctx.observer.emit(
            Level::Error,
            &format!(
                "[{}] no {} values found for {} ({} day(s) without a value)",
                ctx.request_id,
                report.metric,
                report.range,
                report.series.len()
            ),
        );
        return Ok(FetchResult::NoDataFound {
            failures: report.failures,
            cancelled: report.cancelled,
        });
    }

    Ok(FetchResult::Data(SummaryReport {
        request_id: report.request_id,
        metric: report.metric,
        range: report.range,
        monthly: aggregate(&report.series, Granularity::Month),
        yearly: aggregate(&report.series, Granularity::Year),
        failures: report.failures,
        cancelled: report.cancelled,
    }))
}
