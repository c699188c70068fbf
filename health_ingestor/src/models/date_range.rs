//! Calendar-day ranges and the spans used to cut them into chunks.

use std::{fmt, str::FromStr};

use chrono::{Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::errors::Error;

/// An inclusive range of calendar days, `start..=end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Builds a range, rejecting `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, Error> {
        if start > end {
            return Err(Error::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// Number of days covered, both ends included.
    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.start, self.end)
    }
}

/// Largest span a single upstream request may cover.
///
/// Amounts are signed so that a nonsensical `0d` or `-1y` coming from a config
/// file survives parsing and is rejected with a proper `InvalidConfig` by the
/// planner instead of a parse error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ChunkSpan {
    Days(i32),
    Months(i32),
    Years(i32),
}

impl ChunkSpan {
    pub fn amount(&self) -> i32 {
        match *self {
            ChunkSpan::Days(n) | ChunkSpan::Months(n) | ChunkSpan::Years(n) => n,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.amount() <= 0 {
            return Err(Error::InvalidConfig(format!(
                "chunk span must be positive, got {self}"
            )));
        }
        Ok(())
    }

    /// Last day of a chunk that starts on `start`, or `None` past the calendar's end
    /// (including spans too wide to express in months).
    ///
    /// `start + span - 1 day`, using calendar arithmetic for months and years.
    pub(crate) fn last_day_from(&self, start: NaiveDate) -> Option<NaiveDate> {
        let next_start = match *self {
            ChunkSpan::Days(n) => start.checked_add_days(Days::new(u64::try_from(n).ok()?)),
            ChunkSpan::Months(n) => start.checked_add_months(Months::new(u32::try_from(n).ok()?)),
            ChunkSpan::Years(n) => {
                let months = u32::try_from(n).ok()?.checked_mul(12)?;
                start.checked_add_months(Months::new(months))
            }
        }?;
        next_start.pred_opt()
    }
}

impl fmt::Display for ChunkSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ChunkSpan::Days(n) => write!(f, "{n}d"),
            ChunkSpan::Months(n) => write!(f, "{n}m"),
            ChunkSpan::Years(n) => write!(f, "{n}y"),
        }
    }
}

impl FromStr for ChunkSpan {
    type Err = Error;

    /// Parses `90d`, `6m`, `1y` (case-insensitive unit).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || Error::InvalidConfig(format!("invalid chunk span: {s:?}"));
        let unit = s.chars().last().ok_or_else(invalid)?;
        let amount: i32 = s[..s.len() - unit.len_utf8()]
            .trim()
            .parse()
            .map_err(|_| invalid())?;
        match unit.to_ascii_lowercase() {
            'd' => Ok(ChunkSpan::Days(amount)),
            'm' => Ok(ChunkSpan::Months(amount)),
            'y' => Ok(ChunkSpan::Years(amount)),
            _ => Err(invalid()),
        }
    }
}

impl TryFrom<String> for ChunkSpan {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChunkSpan> for String {
    fn from(value: ChunkSpan) -> Self {
        value.to_string()
    }
}
