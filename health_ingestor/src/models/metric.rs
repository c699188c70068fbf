//! Metric descriptors and the registry that maps metric kinds to them.
//!
//! A [`MetricDescriptor`] carries everything needed to request one metric for
//! a date range and to pull numeric values out of the returned entries:
//!
//! - an endpoint template relative to the API base URL, with `{start}` and
//!   `{end}` placeholders (`YYYY-MM-DD`),
//! - the key under which a successful response lists its entries,
//! - the entry field holding the date,
//! - a [`ValueExtractor`] describing where the number lives,
//! - the widest range the endpoint accepts in one call,
//! - a [`DateMerge`] policy for several entries logged on one date.
//!
//! [`MetricRegistry::standard`] registers the activity, heart and sleep
//! endpoints; lookups go through the [`MetricKind`] tag.

use std::{fmt, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{
    errors::Error,
    models::date_range::{ChunkSpan, DateRange},
};

/// Metric kinds with a registered descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MetricKind {
    Steps,
    Calories,
    Distance,
    RestingHeartRate,
    Sleep,
}

impl MetricKind {
    pub const ALL: [MetricKind; 5] = [
        MetricKind::Steps,
        MetricKind::Calories,
        MetricKind::Distance,
        MetricKind::RestingHeartRate,
        MetricKind::Sleep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Steps => "steps",
            MetricKind::Calories => "calories",
            MetricKind::Distance => "distance",
            MetricKind::RestingHeartRate => "resting-heart-rate",
            MetricKind::Sleep => "sleep",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "steps" => Ok(MetricKind::Steps),
            "calories" => Ok(MetricKind::Calories),
            "distance" => Ok(MetricKind::Distance),
            "heartrate" | "heart-rate" | "resting-heart-rate" => Ok(MetricKind::RestingHeartRate),
            "sleep" => Ok(MetricKind::Sleep),
            other => Err(Error::InvalidConfig(format!("unknown metric: {other}"))),
        }
    }
}

/// Where the numeric value of one response entry lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "field")]
pub enum ValueExtractor {
    /// `entry.value` is the number itself (or a numeric string).
    Value,
    /// `entry.value.<field>`.
    ValueField(String),
    /// `entry.<field>`.
    EntryField(String),
}

impl ValueExtractor {
    /// Pulls a finite number out of `entry`; `None` when absent or non-numeric.
    pub fn extract(&self, entry: &Value) -> Option<f64> {
        let raw = match self {
            ValueExtractor::Value => entry.get("value")?,
            ValueExtractor::ValueField(field) => entry.get("value")?.get(field)?,
            ValueExtractor::EntryField(field) => entry.get(field)?,
        };
        let number = match raw {
            Value::Number(n) => n.as_f64()?,
            // activity time series report values as strings, e.g. "8213"
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        number.is_finite().then_some(number)
    }
}

/// How entries of one response that share a date collapse into one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateMerge {
    /// Keep the first entry listed for the date.
    #[default]
    KeepFirst,
    /// Add the values up; the date has no value only if none of its entries has one.
    Sum,
}

impl DateMerge {
    pub fn merge(&self, kept: Option<f64>, next: Option<f64>) -> Option<f64> {
        match (self, kept, next) {
            (DateMerge::KeepFirst, kept, _) => kept,
            (DateMerge::Sum, Some(a), Some(b)) => Some(a + b),
            (DateMerge::Sum, a, b) => a.or(b),
        }
    }
}

/// How to request and decode one metric.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    pub kind: MetricKind,
    pub endpoint_template: String,
    pub success_key: String,
    pub date_key: String,
    pub extractor: ValueExtractor,
    pub max_span: ChunkSpan,
    #[serde(default)]
    pub date_merge: DateMerge,
}

impl MetricDescriptor {
    /// Absolute URL for `range` under `base_url`.
    pub fn url(&self, base_url: &str, range: &DateRange) -> String {
        let path = self
            .endpoint_template
            .replace("{start}", &range.start.format("%Y-%m-%d").to_string())
            .replace("{end}", &range.end.format("%Y-%m-%d").to_string());
        format!(
            "{}/{}",
            base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Registered descriptors, in registration order.
#[derive(Debug, Clone, Default)]
pub struct MetricRegistry {
    descriptors: IndexMap<MetricKind, MetricDescriptor>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptors for every [`MetricKind`].
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for (kind, resource, key) in [
            (MetricKind::Steps, "steps", "activities-steps"),
            (MetricKind::Calories, "calories", "activities-calories"),
            (MetricKind::Distance, "distance", "activities-distance"),
        ] {
            registry.register(MetricDescriptor {
                kind,
                endpoint_template: format!("1/user/-/activities/{resource}/date/{{start}}/{{end}}.json"),
                success_key: key.to_string(),
                date_key: "dateTime".to_string(),
                extractor: ValueExtractor::Value,
                max_span: ChunkSpan::Days(1095),
                date_merge: DateMerge::KeepFirst,
            });
        }
        registry.register(MetricDescriptor {
            kind: MetricKind::RestingHeartRate,
            endpoint_template: "1/user/-/activities/heart/date/{start}/{end}.json".to_string(),
            success_key: "activities-heart".to_string(),
            date_key: "dateTime".to_string(),
            extractor: ValueExtractor::ValueField("restingHeartRate".to_string()),
            max_span: ChunkSpan::Years(1),
            date_merge: DateMerge::KeepFirst,
        });
        registry.register(MetricDescriptor {
            kind: MetricKind::Sleep,
            endpoint_template: "1.2/user/-/sleep/date/{start}/{end}.json".to_string(),
            success_key: "sleep".to_string(),
            date_key: "dateOfSleep".to_string(),
            extractor: ValueExtractor::EntryField("minutesAsleep".to_string()),
            max_span: ChunkSpan::Days(100),
            // a night can hold a main sleep and naps, each logged separately
            date_merge: DateMerge::Sum,
        });
        registry
    }

    /// Adds or replaces the descriptor for its kind.
    pub fn register(&mut self, descriptor: MetricDescriptor) -> Option<MetricDescriptor> {
        self.descriptors.insert(descriptor.kind, descriptor)
    }

    pub fn descriptor(&self, kind: MetricKind) -> Result<&MetricDescriptor, Error> {
        self.descriptors
            .get(&kind)
            .ok_or_else(|| Error::InvalidConfig(format!("no descriptor registered for {kind}")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricDescriptor> {
        self.descriptors.values()
    }
}
