//! Folds per-chunk outcomes into one series and a failure log.

use log::{Level, debug};

use crate::{
    models::{
        date_range::DateRange,
        outcome::{ApiOutcome, ChunkFailure, UpstreamErrorKind},
        record::{RawRecord, TimeSeries},
    },
    observe::Observer,
};

/// Combines chunk outcomes, given in chronological order.
///
/// Successful chunks contribute their records; every other outcome becomes a
/// [`ChunkFailure`] and assembly carries on with the next chunk. The result is
/// always sorted with unique dates. Reordering alone is silent; should two
/// chunks repeat a date, the first record wins and `observer` is told how
/// many were dropped.
pub fn combine(
    outcomes: Vec<(DateRange, ApiOutcome)>,
    observer: &dyn Observer,
) -> (TimeSeries, Vec<ChunkFailure>) {
    let mut records: Vec<RawRecord> = Vec::new();
    let mut failures = Vec::new();

    for (range, outcome) in outcomes {
        match outcome {
            ApiOutcome::Success(chunk) => records.extend(chunk),
            ApiOutcome::RateLimited(message) => failures.push(ChunkFailure {
                range,
                kind: UpstreamErrorKind::RateLimited,
                message,
            }),
            ApiOutcome::Fatal(kind, message) => failures.push(ChunkFailure {
                range,
                kind,
                message,
            }),
        }
    }

    if !TimeSeries::is_strictly_ordered(&records) {
        debug!("reordering {} assembled records by date", records.len());
    }
    let (series, dropped) = TimeSeries::from_records(records);
    if dropped > 0 {
        observer.emit(
            Level::Warn,
            &format!("dropped {dropped} record(s) repeating a date already assembled"),
        );
    }
    (series, failures)
}
