//! Calendar aggregation periods.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Calendar period used to group a series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    Month,
    Year,
}

impl Granularity {
    /// First day of the period containing `date`.
    pub fn period_start(&self, date: NaiveDate) -> NaiveDate {
        let (year, month) = match self {
            Granularity::Month => (date.year(), date.month()),
            Granularity::Year => (date.year(), 1),
        };
        // day 1 exists for every valid (year, month) chrono can represent
        NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
    }
}

/// One aggregation period and the mean of its valued records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub granularity: Granularity,
    pub period_start: NaiveDate,
    pub mean_value: Option<f64>,
}

impl Bucket {
    /// `2023-01` for months, `2023` for years.
    pub fn label(&self) -> String {
        match self.granularity {
            Granularity::Month => self.period_start.format("%Y-%m").to_string(),
            Granularity::Year => self.period_start.format("%Y").to_string(),
        }
    }
}
