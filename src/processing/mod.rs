//! In-memory session processing.
//!
//! The processing layer operates on [`crate::types::DataSet`] values produced by loading. Every
//! function borrows its input and returns a fresh value; the source table is never mutated.
//!
//! - [`date_range`]: validation/correction of user-selected periods
//! - [`filter`]: [`FilterCriteria`] and [`filter_sessions`], plus the generic [`filter()`]
//! - [`reduce`]: single-column numeric reductions (count/sum/min/max/mean)
//! - [`aggregate`]: summary metrics, frequency tables, grouped means, time-bucketed counts
//! - [`distribution`]: histogram and quartiles for chart data
//! - [`clean`]: explicit, opt-in cleaning policies
//!
//! ## Example: validate → filter → aggregate
//!
//! ```rust
//! use chrono::NaiveDate;
//! use session_dashboard::processing::{
//!     filter_sessions, session_counts_by_period, validate_date_range, FilterCriteria,
//!     SessionSummary, TimeBucket,
//! };
//! use session_dashboard::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let day = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
//! let schema = Schema::new(vec![
//!     Field::new("date", DataType::DateTime),
//!     Field::new("service", DataType::Utf8),
//!     Field::new("duree_minutes", DataType::Float64),
//! ]);
//! let ds = DataSet::new(
//!     schema,
//!     vec![
//!         vec![Value::DateTime(day(1).and_hms_opt(9, 0, 0).unwrap()), Value::Utf8("Urgences".into()), Value::Float64(12.0)],
//!         vec![Value::DateTime(day(2).and_hms_opt(9, 0, 0).unwrap()), Value::Utf8("Urgences".into()), Value::Float64(18.0)],
//!         vec![Value::DateTime(day(3).and_hms_opt(9, 0, 0).unwrap()), Value::Utf8("Pédiatrie".into()), Value::Null],
//!     ],
//! );
//!
//! // The end bound is in the future relative to "today" and gets clamped.
//! let checked = validate_date_range(day(1), day(5), day(2));
//! assert!(checked.was_clamped);
//!
//! let criteria = FilterCriteria::new()
//!     .with_date_range(checked.range)
//!     .with_services(["Urgences"]);
//! let subset = filter_sessions(&ds, &criteria);
//!
//! let summary = SessionSummary::from_dataset(&subset);
//! assert_eq!(summary.sessions, 2);
//! assert_eq!(summary.mean_duree_minutes, Some(15.0));
//! assert_eq!(session_counts_by_period(&subset, TimeBucket::Day).len(), 2);
//! ```

pub mod aggregate;
pub mod clean;
pub mod date_range;
pub mod distribution;
pub mod filter;
pub mod reduce;

pub use aggregate::{
    column_stats, mean, mean_by_group, note_score_table, session_counts_by_period, value_counts, BucketCount,
    ColumnStats, GroupMean, SessionSummary, TimeBucket, ValueCount,
};
pub use clean::{apply_cleaning, CleaningPolicy};
pub use date_range::{date_bounds, default_date_range, validate_date_range, DateRange, DateRangeValidation};
pub use distribution::{histogram, quartiles, HistogramBin, Quartiles};
pub use filter::{distinct_values, filter, filter_sessions, text_note_columns, FilterCriteria};
pub use reduce::{reduce, ReduceOp};
