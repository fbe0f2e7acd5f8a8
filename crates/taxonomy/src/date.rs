//! Compact date parsing and per-node date ranges.
//!
//! Source data carries creation and modification dates as bare digit
//! strings where the day is not zero-padded:
//!
//! - 7 digits: `DMMYYYY` (e.g. `1032021` is 1 March 2021)
//! - 8 digits: `DDMMYYYY` (e.g. `15032021` is 15 March 2021)
//!
//! Anything else, including `"0"` and empty cells, means "no date".

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

const MIN_YEAR: i32 = 1990;
const MAX_YEAR: i32 = 2030;

/// A validated calendar date decoded from the compact digit encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompactDate(NaiveDate);

impl CompactDate {
    /// Decodes a compact date string, returning `None` for missing or invalid values.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        // Spreadsheet exports sometimes render the integer as a float.
        let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
        if digits.is_empty() || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return None;
        }

        let day_len = match digits.len() {
            7 => 1,
            8 => 2,
            _ => return None,
        };
        let day: u32 = digits[..day_len].parse().ok()?;
        let month: u32 = digits[day_len..day_len + 2].parse().ok()?;
        let year: i32 = digits[day_len + 2..].parse().ok()?;

        if !(1..=31).contains(&day) || !(1..=12).contains(&month) {
            return None;
        }
        if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
            return None;
        }

        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Wraps an already validated calendar date.
    pub fn from_naive(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn naive(&self) -> NaiveDate {
        self.0
    }

    /// Renders the date as `DD.MM.YYYY`.
    pub fn formatted(&self) -> String {
        format!("{:02}.{:02}.{:04}", self.0.day(), self.0.month(), self.0.year())
    }

    /// Renders the date as `YYYY-MM-DD`.
    pub fn iso(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }
}

/// Inclusive earliest/latest range folded from the dates seen on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub earliest: CompactDate,
    pub latest: CompactDate,
}

impl DateRange {
    pub fn single(date: CompactDate) -> Self {
        Self {
            earliest: date,
            latest: date,
        }
    }

    /// Widens the range to include `date`.
    pub fn include(&mut self, date: CompactDate) {
        if date < self.earliest {
            self.earliest = date;
        }
        if date > self.latest {
            self.latest = date;
        }
    }

    /// Folds `date` into an optional range, creating it on first use.
    pub fn fold(range: &mut Option<Self>, date: CompactDate) {
        match range {
            Some(existing) => existing.include(date),
            None => *range = Some(Self::single(date)),
        }
    }

    pub fn contains(&self, date: CompactDate) -> bool {
        self.earliest <= date && date <= self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_seven_and_eight_digit_forms() {
        let short = CompactDate::parse("1032021").expect("parse");
        assert_eq!(short.formatted(), "01.03.2021");
        assert_eq!(short.iso(), "2021-03-01");

        let long = CompactDate::parse("15032021").expect("parse");
        assert_eq!(long.formatted(), "15.03.2021");
    }

    #[test]
    fn accepts_float_rendering() {
        let date = CompactDate::parse("15032021.0").expect("parse");
        assert_eq!(date.iso(), "2021-03-15");
    }

    #[test]
    fn rejects_missing_and_malformed_values() {
        for raw in ["", "0", "  ", "123", "123456789", "15a32021", "32012021", "15132021"] {
            assert!(CompactDate::parse(raw).is_none(), "{raw:?} should be rejected");
        }
    }

    #[test]
    fn rejects_years_outside_window() {
        assert!(CompactDate::parse("01011989").is_none());
        assert!(CompactDate::parse("01012031").is_none());
        assert!(CompactDate::parse("01011990").is_some());
        assert!(CompactDate::parse("31122030").is_some());
    }

    #[test]
    fn rejects_days_missing_from_month() {
        assert!(CompactDate::parse("31042021").is_none());
        assert!(CompactDate::parse("29022021").is_none());
        assert!(CompactDate::parse("29022020").is_some());
    }

    #[test]
    fn range_folds_dates() {
        let mut range = None;
        let mid = CompactDate::parse("15062021").expect("parse");
        let early = CompactDate::parse("1012020").expect("parse");
        let late = CompactDate::parse("31122022").expect("parse");

        DateRange::fold(&mut range, mid);
        DateRange::fold(&mut range, early);
        DateRange::fold(&mut range, late);

        let range = range.expect("range");
        assert_eq!(range.earliest, early);
        assert_eq!(range.latest, late);
        assert!(range.contains(mid));
    }
}
