//! Inclusive calendar-day ranges.
//!
//! A run walks its range one day at a time, oldest first, and every query and
//! output record uses the zero-padded `YYYY-MM-DD` rendering of the day.

use chrono::{Days, NaiveDate};

/// Wire/record format for a single day.
pub const DAY_FORMAT: &str = "%Y-%m-%d";

/// Inclusive closed interval `[start, end]` of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Number of days in the range; zero when `start > end`.
    pub fn len(&self) -> usize {
        if self.start > self.end {
            return 0;
        }
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every day in the range, ascending, both endpoints included.
    ///
    /// An inverted range (`start > end`) yields nothing.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        let start = self.start;
        (0..self.len() as u64).filter_map(move |offset| start.checked_add_days(Days::new(offset)))
    }
}

/// Render a day as `YYYY-MM-DD` with zero-padded month and day.
pub fn format_day(day: NaiveDate) -> String {
    day.format(DAY_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` day.
pub fn parse_day(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), DAY_FORMAT)
        .map_err(|e| format!("Invalid date '{raw}' (expected YYYY-MM-DD): {e}"))
}
