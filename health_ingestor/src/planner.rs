//! Splits a date range into contiguous chunks the upstream accepts.

use chrono::NaiveDate;

use crate::{
    errors::Error,
    models::date_range::{ChunkSpan, DateRange},
};

/// Plans the chunks covering `start..=end`, each spanning at most `max_span`.
///
/// Chunks are returned in chronological order, with `next.start = prev.end + 1 day`
/// and the last chunk ending exactly on `end`. An inverted range plans to
/// nothing; a non-positive span is rejected even then.
pub fn plan(start: NaiveDate, end: NaiveDate, max_span: ChunkSpan) -> Result<Vec<DateRange>, Error> {
    max_span.validate()?;

    let mut chunks = Vec::new();
    let mut chunk_start = start;
    while chunk_start <= end {
        let chunk_end = max_span
            .last_day_from(chunk_start)
            .map_or(end, |last| last.min(end));
        chunks.push(DateRange {
            start: chunk_start,
            end: chunk_end,
        });
        match chunk_end.succ_opt() {
            Some(next) => chunk_start = next,
            None => break,
        }
    }
    Ok(chunks)
}

/// [`plan`] over an existing range.
pub fn plan_range(range: &DateRange, max_span: ChunkSpan) -> Result<Vec<DateRange>, Error> {
    plan(range.start, range.end, max_span)
}
