//! Loading entrypoints and implementations.
//!
//! Most callers should use [`load_sessions`] (from [`loader`]), or a [`DatasetCache`] when the
//! same source is requested repeatedly. Loading:
//!
//! - reads a CSV source into an in-memory [`crate::types::DataSet`]
//! - coerces date columns, turning unparsable values into nulls
//! - adds every missing expected session column, filled with nulls
//! - optionally reports success/missing source/failure/alerts to an [`IngestionObserver`]
//!
//! The raw CSV reader is available under [`csv`].

pub mod cache;
pub mod csv;
pub mod loader;
pub mod observability;

pub use cache::DatasetCache;
pub use loader::{load_sessions, LoadOptions, LoadStatus, LoadedDataset};
pub use observability::{
    CompositeObserver, FileObserver, IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats,
    StdErrObserver, TracingObserver,
};
