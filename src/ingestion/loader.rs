//! Session dataset loader.
//!
//! [`load_sessions`] reads a CSV source into an in-memory [`crate::types::DataSet`] and
//! guarantees the nine expected session columns exist. A missing source is recovered locally:
//! the caller gets an empty dataset tagged with [`LoadStatus::SourceNotFound`].
//!
//! If an [`IngestionObserver`] is provided, success/missing-source/failure/alerts are reported
//! to it.

use std::error::Error as StdError;
use std::fmt;
use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use crate::error::{IngestionError, IngestionResult};
use crate::sessions::ensure_expected_columns;
use crate::types::DataSet;

use super::csv::{ingest_csv_from_reader, reader_builder, CsvReadOptions};
use super::observability::{IngestionContext, IngestionObserver, IngestionSeverity, IngestionStats};

/// Outcome of locating the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStatus {
    /// The source was read.
    Loaded,
    /// The source path does not exist; the dataset is empty.
    SourceNotFound,
}

/// A loaded dataset together with how it was obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedDataset {
    /// The table. Always carries the expected session columns.
    pub dataset: DataSet,
    /// Whether the source was found.
    pub status: LoadStatus,
    /// Load statistics (also reported to the observer).
    pub stats: IngestionStats,
}

impl LoadedDataset {
    /// `true` when there are no rows to work with, whatever the reason.
    pub fn is_empty(&self) -> bool {
        self.dataset.is_empty()
    }
}

/// Options controlling loading behavior.
///
/// Use [`Default`] for common cases.
#[derive(Clone)]
pub struct LoadOptions {
    /// Cell typing options.
    pub csv: CsvReadOptions,
    /// Optional observer for logging/alerts.
    pub observer: Option<Arc<dyn IngestionObserver>>,
    /// Severity threshold at which `on_alert` is invoked.
    pub alert_at_or_above: IngestionSeverity,
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("csv", &self.csv)
            .field("observer_set", &self.observer.is_some())
            .field("alert_at_or_above", &self.alert_at_or_above)
            .finish()
    }
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            csv: CsvReadOptions::default(),
            observer: None,
            alert_at_or_above: IngestionSeverity::Critical,
        }
    }
}

/// Load a session CSV.
///
/// - Date columns are parsed into timestamps; unparsable values become null.
/// - Expected columns absent from the source are added, filled with nulls.
/// - Rows are neither deduplicated nor dropped.
///
/// When an observer is configured, this function reports:
///
/// - `on_success` on success, with row/column/coercion stats
/// - `on_missing_source` when the path does not exist
/// - `on_failure` on failure, with a computed severity
/// - `on_alert` on failure when the computed severity is >= `options.alert_at_or_above`
///
/// ```no_run
/// use session_dashboard::ingestion::{load_sessions, LoadOptions, LoadStatus};
///
/// # fn main() -> Result<(), session_dashboard::IngestionError> {
/// let loaded = load_sessions("sessions_dataset_320.csv", &LoadOptions::default())?;
/// if loaded.status == LoadStatus::SourceNotFound {
///     eprintln!("dataset missing");
/// }
/// println!("rows={}", loaded.dataset.row_count());
/// # Ok(())
/// # }
/// ```
pub fn load_sessions(path: impl AsRef<Path>, options: &LoadOptions) -> IngestionResult<LoadedDataset> {
    let path = path.as_ref();
    let ctx = IngestionContext {
        path: path.to_path_buf(),
    };

    let result = read_source(path, &options.csv);

    let obs = options.observer.as_ref();
    match &result {
        Ok(loaded) if loaded.status == LoadStatus::SourceNotFound => {
            if let Some(obs) = obs {
                obs.on_missing_source(&ctx);
            }
        }
        Ok(loaded) => {
            if let Some(obs) = obs {
                obs.on_success(&ctx, &loaded.stats);
            }
        }
        Err(e) => {
            if let Some(obs) = obs {
                let sev = severity_for_error(e);
                obs.on_failure(&ctx, sev, e);
                if sev >= options.alert_at_or_above {
                    obs.on_alert(&ctx, sev, e);
                }
            }
        }
    }

    result
}

fn read_source(path: &Path, csv_options: &CsvReadOptions) -> IngestionResult<LoadedDataset> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            let mut dataset = DataSet::empty();
            let synthesized_columns = ensure_expected_columns(&mut dataset);
            return Ok(LoadedDataset {
                stats: IngestionStats {
                    rows: 0,
                    columns: dataset.column_count(),
                    unparsable_values: 0,
                    synthesized_columns,
                },
                dataset,
                status: LoadStatus::SourceNotFound,
            });
        }
        Err(e) => return Err(e.into()),
    };

    let mut rdr = reader_builder().from_reader(file);
    let ingested = ingest_csv_from_reader(&mut rdr, csv_options)?;
    let mut dataset = ingested.dataset;
    let synthesized_columns = ensure_expected_columns(&mut dataset);

    Ok(LoadedDataset {
        stats: IngestionStats {
            rows: dataset.row_count(),
            columns: dataset.column_count(),
            unparsable_values: ingested.unparsable_values,
            synthesized_columns,
        },
        dataset,
        status: LoadStatus::Loaded,
    })
}

fn severity_for_error(e: &IngestionError) -> IngestionSeverity {
    match e {
        IngestionError::Io(_) => IngestionSeverity::Critical,
        IngestionError::Csv(err) => match err.kind() {
            ::csv::ErrorKind::Io(_) => IngestionSeverity::Critical,
            _ if error_chain_contains_io(err) => IngestionSeverity::Critical,
            _ => IngestionSeverity::Error,
        },
        IngestionError::SchemaMismatch { .. } => IngestionSeverity::Error,
    }
}

fn error_chain_contains_io(e: &(dyn StdError + 'static)) -> bool {
    let mut cur: Option<&(dyn StdError + 'static)> = Some(e);
    while let Some(err) = cur {
        if err.is::<std::io::Error>() {
            return true;
        }
        cur = err.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_of_io_is_critical() {
        let err = IngestionError::Io(std::io::Error::new(ErrorKind::PermissionDenied, "nope"));
        assert_eq!(severity_for_error(&err), IngestionSeverity::Critical);
    }

    #[test]
    fn severity_of_schema_mismatch_is_error() {
        let err = IngestionError::SchemaMismatch {
            message: "dup".to_string(),
        };
        assert_eq!(severity_for_error(&err), IngestionSeverity::Error);
    }

    #[test]
    fn missing_source_yields_empty_dataset_with_expected_columns() {
        let loaded = load_sessions("definitely/not/here.csv", &LoadOptions::default()).unwrap();
        assert_eq!(loaded.status, LoadStatus::SourceNotFound);
        assert!(loaded.is_empty());
        assert_eq!(loaded.dataset.column_count(), 9);
    }
}
