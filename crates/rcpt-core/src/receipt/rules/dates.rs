//! Receipt date resolution.
//!
//! Ambiguous numeric dates are settled by a fixed priority order, never by
//! locale. The earliest match in the text wins; when several layouts match
//! at the same position the layout listed first wins. A match that is not a
//! real calendar date is dropped for that layout only, so `13/02/2024` falls
//! through month-first to day-first under the default order.

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::FieldExtractor;
use super::patterns::{
    DATE_NUMERIC_DASH, DATE_NUMERIC_DOT, DATE_NUMERIC_SLASH, DATE_YMD_DASH, DATE_YMD_SLASH,
};

/// A recognised date layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFormat {
    /// YYYY-MM-DD
    YearMonthDayDash,
    /// YYYY/MM/DD
    YearMonthDaySlash,
    /// MM/DD/YYYY
    MonthDayYearSlash,
    /// MM-DD-YYYY
    MonthDayYearDash,
    /// DD/MM/YYYY
    DayMonthYearSlash,
    /// DD.MM.YYYY
    DayMonthYearDot,
}

impl DateFormat {
    /// Default priority order, highest first.
    pub const fn default_priority() -> &'static [DateFormat] {
        &[
            Self::YearMonthDayDash,
            Self::YearMonthDaySlash,
            Self::MonthDayYearSlash,
            Self::MonthDayYearDash,
            Self::DayMonthYearSlash,
            Self::DayMonthYearDot,
        ]
    }

    /// Human-readable layout.
    pub fn layout(self) -> &'static str {
        match self {
            Self::YearMonthDayDash => "YYYY-MM-DD",
            Self::YearMonthDaySlash => "YYYY/MM/DD",
            Self::MonthDayYearSlash => "MM/DD/YYYY",
            Self::MonthDayYearDash => "MM-DD-YYYY",
            Self::DayMonthYearSlash => "DD/MM/YYYY",
            Self::DayMonthYearDot => "DD.MM.YYYY",
        }
    }

    fn pattern(self) -> &'static Regex {
        match self {
            Self::YearMonthDayDash => &*DATE_YMD_DASH,
            Self::YearMonthDaySlash => &*DATE_YMD_SLASH,
            Self::MonthDayYearSlash | Self::DayMonthYearSlash => &*DATE_NUMERIC_SLASH,
            Self::MonthDayYearDash => &*DATE_NUMERIC_DASH,
            Self::DayMonthYearDot => &*DATE_NUMERIC_DOT,
        }
    }

    /// Capture group indices of (year, month, day).
    fn groups(self) -> (usize, usize, usize) {
        match self {
            Self::YearMonthDayDash | Self::YearMonthDaySlash => (1, 2, 3),
            Self::MonthDayYearSlash | Self::MonthDayYearDash => (3, 1, 2),
            Self::DayMonthYearSlash | Self::DayMonthYearDot => (3, 2, 1),
        }
    }

    /// All valid dates of this layout in the text, in reading order.
    fn matches(self, text: &str) -> Vec<DateMatch> {
        let (year_idx, month_idx, day_idx) = self.groups();
        let mut results = Vec::new();

        for caps in self.pattern().captures_iter(text) {
            let Some(full_match) = caps.get(0) else {
                continue;
            };

            // Part of a longer digit run (order numbers, barcodes).
            if touches_digit(text, full_match.start(), full_match.end()) {
                continue;
            }

            let year: i32 = caps[year_idx].parse().unwrap_or(0);
            let month: u32 = caps[month_idx].parse().unwrap_or(0);
            let day: u32 = caps[day_idx].parse().unwrap_or(0);

            if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
                results.push(DateMatch {
                    date,
                    format: self,
                    position: full_match.start(),
                    source: full_match.as_str().to_string(),
                });
            }
        }

        results
    }
}

fn touches_digit(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    before.is_some_and(|c| c.is_ascii_digit()) || after.is_some_and(|c| c.is_ascii_digit())
}

/// A date found in receipt text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateMatch {
    pub date: NaiveDate,
    /// Layout that produced the match.
    pub format: DateFormat,
    /// Byte offset in the source text.
    pub position: usize,
    /// Matched text.
    pub source: String,
}

/// Finds the receipt date in OCR text.
#[derive(Debug, Clone)]
pub struct DateResolver {
    formats: Vec<DateFormat>,
}

impl DateResolver {
    /// Create a resolver trying `formats` in priority order (duplicates ignored).
    pub fn new(formats: impl IntoIterator<Item = DateFormat>) -> Self {
        let mut unique = Vec::new();
        for format in formats {
            if !unique.contains(&format) {
                unique.push(format);
            }
        }
        Self { formats: unique }
    }

    /// The date in the text, or `default` when there is none.
    pub fn resolve(&self, text: &str, default: NaiveDate) -> NaiveDate {
        self.extract(text).map(|m| m.date).unwrap_or(default)
    }
}

impl Default for DateResolver {
    fn default() -> Self {
        Self::new(DateFormat::default_priority().iter().copied())
    }
}

impl FieldExtractor for DateResolver {
    type Output = DateMatch;

    fn extract(&self, text: &str) -> Option<Self::Output> {
        self.extract_all(text).into_iter().next()
    }

    /// Every candidate ordered by position, then by format priority.
    fn extract_all(&self, text: &str) -> Vec<Self::Output> {
        let mut results: Vec<(usize, DateMatch)> = self
            .formats
            .iter()
            .enumerate()
            .flat_map(|(rank, format)| format.matches(text).into_iter().map(move |m| (rank, m)))
            .collect();

        results.sort_by_key(|(rank, m)| (m.position, *rank));
        results.into_iter().map(|(_, m)| m).collect()
    }
}
