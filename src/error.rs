//! Error types for loading and exporting session data.

use thiserror::Error;

/// Convenience result type for ingestion operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Error type returned by ingestion functions.
///
/// A missing source file is not an error: the loader reports it through
/// [`crate::ingestion::LoadStatus::SourceNotFound`] and returns an empty dataset.
/// Unparsable cells are not errors either; they are coerced to [`crate::types::Value::Null`].
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Underlying I/O error (e.g. permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV ingestion error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// The input header cannot be mapped onto a table (duplicate column names, etc.).
    #[error("schema mismatch: {message}")]
    SchemaMismatch { message: String },
}

/// Error type returned by [`crate::export`].
#[derive(Debug, Error)]
pub enum ExportError {
    /// CSV serialization error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to flush the underlying writer.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
