//! `session-dashboard` is the data core of a medical-session dashboard: it loads a session CSV
//! into an in-memory [`types::DataSet`], filters it by user-selected criteria, computes the
//! figures a dashboard displays, and exports subsets back to CSV.
//!
//! The presentation layer (widgets, charts, layout) lives elsewhere; it constructs a
//! [`processing::FilterCriteria`] from its inputs, owns the "today" clock, and consumes the
//! values returned here.
//!
//! ## Loading
//!
//! [`ingestion::load_sessions`] reads a CSV file, parses the `date` column into timestamps
//! (unparsable values become [`types::Value::Null`]), and adds any of the nine expected session
//! columns that are missing, filled with nulls. A missing file is not an error: the result is
//! an empty dataset tagged [`ingestion::LoadStatus::SourceNotFound`].
//!
//! Use an [`ingestion::DatasetCache`] to load each path once per process:
//!
//! ```no_run
//! use session_dashboard::ingestion::{DatasetCache, LoadOptions, LoadStatus};
//!
//! # fn main() -> Result<(), session_dashboard::IngestionError> {
//! let cache = DatasetCache::new();
//! let loaded = cache.get_or_load("sessions_dataset_320.csv", &LoadOptions::default())?;
//! if loaded.status == LoadStatus::SourceNotFound {
//!     eprintln!("place sessions_dataset_320.csv next to the binary");
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Filtering, aggregation and export
//!
//! ```rust
//! use chrono::NaiveDate;
//! use session_dashboard::export::export_csv;
//! use session_dashboard::processing::{filter_sessions, value_counts, FilterCriteria, SessionSummary};
//! use session_dashboard::types::{DataSet, DataType, Field, Schema, Value};
//!
//! let ds = DataSet::new(
//!     Schema::new(vec![
//!         Field::new("date", DataType::DateTime),
//!         Field::new("langue", DataType::Utf8),
//!         Field::new("note_praticien", DataType::Float64),
//!         Field::new("note_commentaire", DataType::Utf8),
//!     ]),
//!     vec![
//!         vec![
//!             Value::DateTime(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap()),
//!             Value::Utf8("arabe".into()),
//!             Value::Float64(4.5),
//!             Value::Utf8("Très bien".into()),
//!         ],
//!         vec![Value::Null, Value::Utf8("anglais".into()), Value::Float64(2.0), Value::Null],
//!     ],
//! );
//!
//! let subset = filter_sessions(&ds, &FilterCriteria::new().with_min_note(3.0).with_query("BIEN"));
//! assert_eq!(SessionSummary::from_dataset(&subset).sessions, 1);
//! assert_eq!(value_counts(&subset, "langue")[0].value, "arabe");
//!
//! let csv = String::from_utf8(export_csv(&subset).unwrap()).unwrap();
//! assert!(csv.contains("2024-01-01,arabe,4.5,Très bien"));
//! ```
//!
//! ## Modules
//!
//! - [`ingestion`]: CSV loading, the dataset cache, and load observers
//! - [`processing`]: date-range validation, filtering, aggregation, cleaning policies
//! - [`export`]: date-only display formatting and CSV export
//! - [`report`]: the one-shot batch report
//! - [`sessions`]: session column names and the expected-column contract
//! - [`types`]: schema + in-memory dataset types
//! - [`error`]: error types

#![warn(missing_docs)]

pub mod error;
pub mod export;
pub mod ingestion;
pub mod processing;
pub mod report;
pub mod sessions;
pub mod types;

pub use error::{ExportError, IngestionError, IngestionResult};
