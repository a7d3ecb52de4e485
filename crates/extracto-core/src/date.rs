//! Calendar dates for draw extracts and inclusive date-range expansion.
//!
//! The upstream API and every report use the `dd/mm/yyyy` form. Date inputs
//! coming from forms or the command line are often ISO `yyyy-mm-dd`, so both
//! are accepted on parse; display is always the canonical, zero-padded form.

use std::fmt;
use std::str::FromStr;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest range (in days, inclusive) callers should request in one go.
///
/// [`expand_range`] itself has no limit; use [`ensure_max_span`] to enforce it.
pub const MAX_RANGE_DAYS: usize = 31;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("invalid date {0:?}: expected dd/mm/yyyy or yyyy-mm-dd")]
    Parse(String),

    #[error("invalid range: {from} is after {to}")]
    InvalidRange { from: DrawDate, to: DrawDate },

    #[error("range {from} to {to} spans {days} days (max {max})")]
    SpanTooLong {
        from: DrawDate,
        to: DrawDate,
        days: usize,
        max: usize,
    },
}

/// A draw date. Ordering is calendar order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct DrawDate(NaiveDate);

impl DrawDate {
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    /// The following calendar day.
    pub fn succ(&self) -> Option<Self> {
        self.0.checked_add_days(Days::new(1)).map(Self)
    }

    /// Canonical text with `-` instead of `/`, for use in file names.
    pub fn file_stem(&self) -> String {
        self.0.format("%d-%m-%Y").to_string()
    }
}

impl From<NaiveDate> for DrawDate {
    fn from(d: NaiveDate) -> Self {
        Self(d)
    }
}

impl fmt::Display for DrawDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%d/%m/%Y"))
    }
}

impl FromStr for DrawDate {
    type Err = DateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = if s.contains('/') {
            NaiveDate::parse_from_str(s, "%d/%m/%Y")
        } else {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
        };
        parsed.map(Self).map_err(|_| DateError::Parse(s.to_string()))
    }
}

impl From<DrawDate> for String {
    fn from(d: DrawDate) -> Self {
        d.to_string()
    }
}

impl TryFrom<String> for DrawDate {
    type Error = DateError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Expand `from..=to` into every calendar day, in ascending order.
pub fn expand_range(from: DrawDate, to: DrawDate) -> Result<Vec<DrawDate>, DateError> {
    if from > to {
        return Err(DateError::InvalidRange { from, to });
    }

    let mut dates = Vec::new();
    let mut current = Some(from);
    while let Some(d) = current
        && d <= to
    {
        dates.push(d);
        current = d.succ();
    }
    Ok(dates)
}

/// Number of days in `from..=to`, or zero when the range is inverted.
pub fn span_days(from: DrawDate, to: DrawDate) -> usize {
    if from > to {
        return 0;
    }
    (to.0 - from.0).num_days() as usize + 1
}

/// Reject inverted ranges and ranges longer than `max` days.
pub fn ensure_max_span(from: DrawDate, to: DrawDate, max: usize) -> Result<(), DateError> {
    if from > to {
        return Err(DateError::InvalidRange { from, to });
    }
    let days = span_days(from, to);
    if days > max {
        return Err(DateError::SpanTooLong {
            from,
            to,
            days,
            max,
        });
    }
    Ok(())
}
