//! Date-range validation for user-selected periods.

use chrono::NaiveDate;
use serde::Serialize;

use crate::sessions;
use crate::types::DataSet;

/// Inclusive calendar-date interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    /// First day included.
    pub start: NaiveDate,
    /// Last day included.
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range. No ordering is enforced; see [`validate_date_range`].
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A single-day range.
    pub fn day(day: NaiveDate) -> Self {
        Self::new(day, day)
    }

    /// Whether `date` lies within `[start, end]`.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// A corrected range plus what had to be corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRangeValidation {
    /// The normalized range; always `start <= end <= today`.
    pub range: DateRange,
    /// The raw start was after the raw end and the bounds were swapped.
    pub was_inverted: bool,
    /// At least one bound was after `today` and was pulled back to it.
    pub was_clamped: bool,
}

impl DateRangeValidation {
    /// `true` if the caller should tell the user their selection was adjusted.
    pub fn was_corrected(&self) -> bool {
        self.was_inverted || self.was_clamped
    }
}

/// Normalize a user-selected `(start, end)` pair against `today`.
///
/// Inverted bounds are swapped first, then any bound after `today` is clamped to `today`. Two
/// future bounds therefore collapse onto the single day `today`.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate, today: NaiveDate) -> DateRangeValidation {
    let (mut start, mut end, was_inverted) = if start > end {
        (end, start, true)
    } else {
        (start, end, false)
    };

    let mut was_clamped = false;
    if start > today {
        start = today;
        was_clamped = true;
    }
    if end > today {
        end = today;
        was_clamped = true;
    }

    DateRangeValidation {
        range: DateRange::new(start, end),
        was_inverted,
        was_clamped,
    }
}

/// Earliest and latest calendar date in the dataset's date column, ignoring nulls.
pub fn date_bounds(dataset: &DataSet) -> Option<(NaiveDate, NaiveDate)> {
    dataset
        .column(sessions::DATE)?
        .filter_map(|v| v.as_date())
        .fold(None, |acc, d| match acc {
            None => Some((d, d)),
            Some((lo, hi)) => Some((lo.min(d), hi.max(d))),
        })
}

/// Initial selection for a date picker spanning `[min, max]` that may not go past `today`.
///
/// The end is `min(max, today)`; the start is `min` unless that would put it after the end.
pub fn default_date_range(min: NaiveDate, max: NaiveDate, today: NaiveDate) -> DateRange {
    let end = max.min(today);
    let start = if min <= end { min } else { end };
    DateRange::new(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field, Schema, Value};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn valid_range_is_untouched() {
        let v = validate_date_range(d(2024, 1, 1), d(2024, 1, 10), d(2024, 2, 1));
        assert_eq!(v.range, DateRange::new(d(2024, 1, 1), d(2024, 1, 10)));
        assert!(!v.was_inverted);
        assert!(!v.was_clamped);
        assert!(!v.was_corrected());
    }

    #[test]
    fn inverted_range_is_swapped() {
        let v = validate_date_range(d(2024, 1, 10), d(2024, 1, 1), d(2024, 2, 1));
        assert_eq!(v.range, DateRange::new(d(2024, 1, 1), d(2024, 1, 10)));
        assert!(v.was_inverted);
        assert!(!v.was_clamped);
    }

    #[test]
    fn future_end_is_clamped_to_today() {
        let v = validate_date_range(d(2024, 1, 1), d(2024, 3, 1), d(2024, 2, 1));
        assert_eq!(v.range, DateRange::new(d(2024, 1, 1), d(2024, 2, 1)));
        assert!(v.was_clamped);
        assert!(!v.was_inverted);
    }

    #[test]
    fn two_future_bounds_collapse_to_today() {
        let today = d(2024, 2, 1);
        let v = validate_date_range(d(2024, 5, 1), d(2024, 3, 1), today);
        assert_eq!(v.range, DateRange::day(today));
        assert!(v.was_inverted);
        assert!(v.was_clamped);
    }

    #[test]
    fn result_is_always_ordered_and_not_after_today() {
        let today = d(2024, 6, 15);
        for (a, b) in [(1, 200), (200, 1), (170, 180), (180, 170), (100, 100), (300, 250)] {
            let start = d(2024, 1, 1) + chrono::Days::new(a);
            let end = d(2024, 1, 1) + chrono::Days::new(b);
            let v = validate_date_range(start, end, today);
            assert!(v.range.start <= v.range.end);
            assert!(v.range.end <= today);
        }
    }

    #[test]
    fn default_range_clamps_to_today() {
        assert_eq!(
            default_date_range(d(2024, 1, 1), d(2024, 12, 31), d(2024, 6, 1)),
            DateRange::new(d(2024, 1, 1), d(2024, 6, 1))
        );
        // Every date in the data is in the future.
        assert_eq!(
            default_date_range(d(2024, 8, 1), d(2024, 12, 31), d(2024, 6, 1)),
            DateRange::day(d(2024, 6, 1))
        );
    }

    #[test]
    fn date_bounds_ignores_nulls() {
        let ds = DataSet::new(
            Schema::new(vec![Field::new("date", DataType::DateTime)]),
            vec![
                vec![Value::DateTime(d(2024, 3, 5).and_hms_opt(9, 0, 0).unwrap())],
                vec![Value::Null],
                vec![Value::DateTime(d(2024, 1, 2).and_hms_opt(23, 59, 0).unwrap())],
            ],
        );
        assert_eq!(date_bounds(&ds), Some((d(2024, 1, 2), d(2024, 3, 5))));
        assert_eq!(date_bounds(&DataSet::empty()), None);
    }
}
