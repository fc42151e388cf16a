//! Fiscal quarter labels of the fixed form `YYYYQn`.
//!
//! Parsing never fails loudly: a label that does not match the shape maps to
//! `None`, and callers drop the row from whatever time-keyed aggregation
//! needs that field.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::CapexError;

/// A parsed fiscal quarter. Ordered chronologically by (year, quarter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FiscalQuarter {
    year: i32,
    quarter: u8,
}

impl FiscalQuarter {
    /// Build a quarter, rejecting quarter numbers outside 1..=4.
    pub fn new(year: i32, quarter: u8) -> Option<Self> {
        (1..=4).contains(&quarter).then_some(Self { year, quarter })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn quarter(&self) -> u8 {
        self.quarter
    }

    /// Composite ordering index `year * 4 + quarter`.
    pub fn index(&self) -> i32 {
        self.year * 4 + i32::from(self.quarter)
    }

    /// The quarter `n` quarters after this one.
    pub fn offset(&self, n: u32) -> Self {
        let zero_based = self.year as i64 * 4 + i64::from(self.quarter - 1) + i64::from(n);
        Self {
            year: zero_based.div_euclid(4) as i32,
            quarter: (zero_based.rem_euclid(4) + 1) as u8,
        }
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    /// First calendar day of the quarter (calendar-aligned fiscal year).
    pub fn start_date(&self) -> Option<NaiveDate> {
        let month = u32::from(self.quarter - 1) * 3 + 1;
        NaiveDate::from_ymd_opt(self.year, month, 1)
    }
}

impl fmt::Display for FiscalQuarter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}Q{}", self.year, self.quarter)
    }
}

impl FromStr for FiscalQuarter {
    type Err = CapexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_label(s).ok_or_else(|| CapexError::InvalidInput {
            field: "quarter".into(),
            reason: format!("'{s}' is not a YYYYQn fiscal quarter label"),
        })
    }
}

impl Serialize for FiscalQuarter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FiscalQuarter {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse an optional label. Missing labels and anything not shaped exactly
/// like `YYYYQn` (n in 1..=4) come back as `None`.
pub fn parse_quarter(label: Option<&str>) -> Option<FiscalQuarter> {
    label.and_then(parse_label)
}

fn parse_label(label: &str) -> Option<FiscalQuarter> {
    let bytes = label.trim().as_bytes();
    if bytes.len() != 6 {
        return None;
    }
    let (year_digits, rest) = bytes.split_at(4);
    if !year_digits.iter().all(u8::is_ascii_digit) {
        return None;
    }
    if !rest[0].eq_ignore_ascii_case(&b'Q') || !rest[1].is_ascii_digit() {
        return None;
    }
    let year = year_digits
        .iter()
        .fold(0i32, |acc, d| acc * 10 + i32::from(d - b'0'));
    FiscalQuarter::new(year, rest[1] - b'0')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_first_and_last_quarter() {
        let q1 = parse_quarter(Some("2025Q1")).unwrap();
        assert_eq!((q1.year(), q1.quarter()), (2025, 1));
        let q4 = parse_quarter(Some("2025Q4")).unwrap();
        assert_eq!((q4.year(), q4.quarter()), (2025, 4));
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        for label in ["Q1-2025", "", "2025", "2025Q5", "2025Q0", "25Q1", "2025-Q1", "2025Q12"] {
            assert_eq!(parse_quarter(Some(label)), None, "label {label:?}");
        }
        assert_eq!(parse_quarter(None), None);
    }

    #[test]
    fn test_parse_trims_and_ignores_separator_case() {
        assert_eq!(parse_quarter(Some(" 2026q3 ")), FiscalQuarter::new(2026, 3));
    }

    #[test]
    fn test_index_and_ordering() {
        let a = FiscalQuarter::new(2025, 4).unwrap();
        let b = FiscalQuarter::new(2026, 1).unwrap();
        assert_eq!(a.index(), 2025 * 4 + 4);
        assert_eq!(b.index() - a.index(), 1);
        assert!(a < b);
    }

    #[test]
    fn test_offset_rolls_over_year() {
        let q = FiscalQuarter::new(2025, 3).unwrap();
        assert_eq!(q.next(), FiscalQuarter::new(2025, 4).unwrap());
        assert_eq!(q.offset(2), FiscalQuarter::new(2026, 1).unwrap());
        assert_eq!(q.offset(9), FiscalQuarter::new(2027, 4).unwrap());
    }

    #[test]
    fn test_display_round_trip_and_start_date() {
        let q: FiscalQuarter = "2027Q2".parse().unwrap();
        assert_eq!(q.to_string(), "2027Q2");
        assert_eq!(q.start_date(), NaiveDate::from_ymd_opt(2027, 4, 1));
    }
}
