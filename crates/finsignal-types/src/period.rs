//! The active accounting period (month + year).

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The month/year window alerts are scoped to.
///
/// The month is stored as a zero-based index (0 = January), following the
/// chrono `month0` convention. Composite alert keys embed `{month0}-{year}`,
/// which keeps keys stable across restarts for read-state and dedup lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    /// Zero-based month index (0 = January, 11 = December)
    pub month0: u32,
    /// Calendar year
    pub year: i32,
}

impl Period {
    /// Create a period from a zero-based month index and year.
    pub fn new(month0: u32, year: i32) -> Self {
        Self { month0, year }
    }

    /// The period containing the given instant.
    pub fn containing(at: DateTime<Utc>) -> Self {
        Self {
            month0: at.month0(),
            year: at.year(),
        }
    }

    /// Whether a timestamp falls inside this period.
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at.month0() == self.month0 && at.year() == self.year
    }

    /// Resolve a day-of-month into a calendar date within this period.
    ///
    /// Returns `None` for days that do not exist in the month (e.g. day 31
    /// in February); callers treat such records as malformed and skip them.
    pub fn day(&self, day: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month0 + 1, day)
    }

    /// Suffix shared by all period-scoped alert keys: `{month0}-{year}`.
    pub fn key_suffix(&self) -> String {
        format!("{}-{}", self.month0, self.year)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month0 + 1, self.year)
    }
}
