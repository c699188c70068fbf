//! Canonical in-memory representation of daily observations.
//!
//! [`RawRecord`] is the vendor-agnostic output of response extraction, and
//! [`TimeSeries`] is the chronological, one-record-per-day collection that the
//! assembler produces and the aggregator consumes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::bucket::Bucket;

/// A single observation for one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub date: NaiveDate,

    /// `None` when the upstream entry exists but carries no usable value
    /// (e.g. a day without a resting heart rate).
    pub value: Option<f64>,
}

impl RawRecord {
    pub fn new(date: NaiveDate, value: Option<f64>) -> Self {
        Self { date, value }
    }
}

/// Records sorted ascending by date with unique dates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TimeSeries {
    records: Vec<RawRecord>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a series from records in any order.
    ///
    /// Records are stably sorted by date and only the first record seen for a
    /// date is kept. Returns the series and the number of records dropped.
    pub fn from_records(mut records: Vec<RawRecord>) -> (Self, usize) {
        let before = records.len();
        records.sort_by_key(|r| r.date);
        records.dedup_by_key(|r| r.date);
        let dropped = before - records.len();
        (Self { records }, dropped)
    }

    /// Re-expresses aggregated buckets as a series keyed by period start.
    pub fn from_buckets(buckets: &[Bucket]) -> Self {
        let records = buckets
            .iter()
            .map(|b| RawRecord::new(b.period_start, b.mean_value))
            .collect();
        Self::from_records(records).0
    }

    /// True when dates are strictly increasing.
    pub fn is_strictly_ordered(records: &[RawRecord]) -> bool {
        records.windows(2).all(|w| w[0].date < w[1].date)
    }

    pub fn records(&self) -> &[RawRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records carrying a value.
    pub fn valued_len(&self) -> usize {
        self.records.iter().filter(|r| r.value.is_some()).count()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RawRecord> {
        self.records.iter()
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = &'a RawRecord;
    type IntoIter = std::slice::Iter<'a, RawRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
