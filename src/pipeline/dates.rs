//! Date normalization for FMCSA record dates.
//!
//! The datasets mix several encodings in the same column: compact `YYYYMMDD`
//! (sometimes followed by a time), ISO-8601 with an optional time suffix,
//! `DD-MMM-YY`, and `MM/DD/YYYY`. Formats are tried in that fixed order and
//! the first valid parse wins; anything else is "no date", which excludes
//! the record from aggregation without failing the run.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// Calendar-month bucket key. Orders chronologically and displays as the
/// sortable `YYYY-MM` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Chart label, e.g. `"Jun 25"`.
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(d) => d.format("%b %y").to_string(),
            None => self.to_string(),
        }
    }

    /// Label with an apostrophe before the year, e.g. `"Jun '25"`. The
    /// dashboard uses this style for the peak-month stat only.
    pub fn quoted_label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(d) => d.format("%b '%y").to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Parses a raw date string in any of the known encodings.
///
/// Compact dates may carry a trailing time after a space (`"20250615
/// 14:22"`), so only the first whitespace-separated token is considered.
/// ISO dates may carry a `T…` time suffix, which is truncated.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let token = raw.trim().split_whitespace().next()?;

    if token.len() == 8 && token.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(d) = NaiveDate::parse_from_str(token, "%Y%m%d") {
            return Some(d);
        }
    }

    let date_part = match token.split_once('T') {
        Some((date, _time)) => date,
        None => token,
    };
    if let Ok(d) = NaiveDate::parse_from_str(date_part, "%Y-%m-%d") {
        return Some(d);
    }

    if let Ok(d) = NaiveDate::parse_from_str(token, "%d-%b-%y") {
        return Some(d);
    }

    if let Ok(d) = NaiveDate::parse_from_str(token, "%m/%d/%Y") {
        return Some(d);
    }

    None
}

/// Parses a raw date string down to its year-month bucket.
pub fn parse_month(raw: &str) -> Option<MonthKey> {
    parse_date(raw).map(MonthKey::from_date)
}
