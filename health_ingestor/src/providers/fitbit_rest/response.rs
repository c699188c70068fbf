use chrono::NaiveDate;
use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use crate::models::{metric::MetricDescriptor, record::RawRecord};

/// One entry of the upstream `{"errors": [...]}` envelope.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct UpstreamError {
    #[serde(rename = "errorType", default)]
    pub error_type: String,
    #[serde(default)]
    pub message: String,
}

/// Returns the first error of the envelope, if the body carries one.
///
/// An `errors` key that cannot be decoded still counts as an error marker; it
/// is reported with an empty type so that it classifies as non-transient.
pub fn error_marker(body: &Value) -> Option<UpstreamError> {
    let errors = body.get("errors")?;
    let first = serde_json::from_value::<Vec<UpstreamError>>(errors.clone())
        .ok()
        .and_then(|list| list.into_iter().next());
    Some(first.unwrap_or_else(|| UpstreamError {
        error_type: String::new(),
        message: errors.to_string(),
    }))
}

/// Records pulled out of a success body.
#[derive(Debug, Default, PartialEq)]
pub struct Extraction {
    pub records: Vec<RawRecord>,
    /// The success key was absent; `records` is empty.
    pub key_missing: bool,
    /// Entries dropped for lacking a parsable date.
    pub skipped: usize,
    /// Entries whose date carried a time-of-day that was cut off.
    pub truncated: usize,
    /// Entries folded into an earlier entry of the same date.
    pub merged: usize,
}

/// Pulls dated records out of a success body, in the order the upstream lists
/// them. Entries sharing a date are folded per the descriptor's
/// [`DateMerge`](crate::models::metric::DateMerge) policy.
pub fn extract_records(body: &Value, descriptor: &MetricDescriptor) -> Extraction {
    let Some(entries) = body.get(&descriptor.success_key).and_then(Value::as_array) else {
        return Extraction {
            key_missing: true,
            ..Default::default()
        };
    };

    let mut out = Extraction::default();
    let mut by_date: IndexMap<NaiveDate, Option<f64>> = IndexMap::with_capacity(entries.len());
    for entry in entries {
        let Some(raw_date) = entry.get(&descriptor.date_key).and_then(Value::as_str) else {
            out.skipped += 1;
            continue;
        };
        let Some(date) = raw_date.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        else {
            out.skipped += 1;
            continue;
        };
        if raw_date.len() > 10 {
            out.truncated += 1;
        }
        let value = descriptor.extractor.extract(entry);
        match by_date.get_mut(&date) {
            Some(kept) => {
                *kept = descriptor.date_merge.merge(*kept, value);
                out.merged += 1;
            }
            None => {
                by_date.insert(date, value);
            }
        }
    }
    out.records = by_date
        .into_iter()
        .map(|(date, value)| RawRecord::new(date, value))
        .collect();
    out
}
