//! Observer hooks for dataset loads: logging, file trails, and alerting.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::error::IngestionError;

/// Severity classification used for observer callbacks and alerting thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum IngestionSeverity {
    /// Informational event.
    Info,
    /// Warning-level event (non-fatal, e.g. a missing source recovered as an empty dataset).
    Warning,
    /// Error-level event (operation failed).
    Error,
    /// Critical error (typically I/O or other infrastructure failures).
    Critical,
}

/// Context about a load attempt.
#[derive(Debug, Clone)]
pub struct IngestionContext {
    /// The input path used for loading.
    pub path: PathBuf,
}

/// Stats reported on a successful load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngestionStats {
    /// Number of loaded rows.
    pub rows: usize,
    /// Number of columns after expected columns were synthesized.
    pub columns: usize,
    /// Cells that failed type coercion and were recovered as null.
    pub unparsable_values: usize,
    /// Expected columns absent from the source and filled with nulls.
    pub synthesized_columns: Vec<String>,
}

/// Observer interface for load outcomes.
///
/// Implementors can record metrics, logs, or trigger alerts.
pub trait IngestionObserver: Send + Sync {
    /// Called when loading succeeds.
    fn on_success(&self, _ctx: &IngestionContext, _stats: &IngestionStats) {}

    /// Called when the source does not exist and an empty dataset is returned instead.
    fn on_missing_source(&self, _ctx: &IngestionContext) {}

    /// Called when loading fails.
    fn on_failure(&self, _ctx: &IngestionContext, _severity: IngestionSeverity, _error: &IngestionError) {}

    /// Called when a load failure meets an alert threshold.
    ///
    /// Default behavior forwards to [`Self::on_failure`].
    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.on_failure(ctx, severity, error)
    }
}

/// An observer that fans out callbacks to a list of observers.
#[derive(Default)]
pub struct CompositeObserver {
    observers: Vec<Arc<dyn IngestionObserver>>,
}

impl CompositeObserver {
    /// Create a new composite observer from a list of observers.
    pub fn new(observers: Vec<Arc<dyn IngestionObserver>>) -> Self {
        Self { observers }
    }
}

impl fmt::Debug for CompositeObserver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeObserver")
            .field("observers_len", &self.observers.len())
            .finish()
    }
}

impl IngestionObserver for CompositeObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: &IngestionStats) {
        for o in &self.observers {
            o.on_success(ctx, stats);
        }
    }

    fn on_missing_source(&self, ctx: &IngestionContext) {
        for o in &self.observers {
            o.on_missing_source(ctx);
        }
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_failure(ctx, severity, error);
        }
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        for o in &self.observers {
            o.on_alert(ctx, severity, error);
        }
    }
}

/// Logs load events to stderr.
#[derive(Debug, Default)]
pub struct StdErrObserver;

impl IngestionObserver for StdErrObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: &IngestionStats) {
        eprintln!(
            "[load][ok] path={} rows={} columns={} unparsable={} synthesized={:?}",
            ctx.path.display(),
            stats.rows,
            stats.columns,
            stats.unparsable_values,
            stats.synthesized_columns
        );
    }

    fn on_missing_source(&self, ctx: &IngestionContext) {
        eprintln!("[load][Warning] path={} source not found", ctx.path.display());
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        eprintln!(
            "[load][{:?}] path={} err={}",
            severity,
            ctx.path.display(),
            error
        );
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        eprintln!(
            "[ALERT][load][{:?}] path={} err={}",
            severity,
            ctx.path.display(),
            error
        );
    }
}

/// Forwards load events to `tracing`.
#[derive(Debug, Default)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: &IngestionStats) {
        tracing::info!(
            path = %ctx.path.display(),
            rows = stats.rows,
            columns = stats.columns,
            unparsable = stats.unparsable_values,
            "dataset loaded"
        );
        if !stats.synthesized_columns.is_empty() {
            tracing::warn!(
                path = %ctx.path.display(),
                columns = ?stats.synthesized_columns,
                "expected columns missing from source, filled with nulls"
            );
        }
    }

    fn on_missing_source(&self, ctx: &IngestionContext) {
        tracing::warn!(path = %ctx.path.display(), "source not found, using empty dataset");
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::error!(path = %ctx.path.display(), ?severity, %error, "dataset load failed");
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        tracing::error!(path = %ctx.path.display(), ?severity, %error, alert = true, "dataset load failed");
    }
}

/// Appends load events to a local log file.
#[derive(Debug)]
pub struct FileObserver {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileObserver {
    /// Create a file observer that appends events to `path`.
    ///
    /// Writes are best-effort; failures to open/write the log file are ignored.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    fn append_line(&self, line: &str) {
        let _guard = self.lock.lock().ok();
        if let Ok(mut f) = OpenOptions::new().create(true).append(true).open(&self.path) {
            let _ = writeln!(f, "{line}");
        }
    }
}

impl IngestionObserver for FileObserver {
    fn on_success(&self, ctx: &IngestionContext, stats: &IngestionStats) {
        self.append_line(&format!(
            "{} ok path={} rows={} columns={} unparsable={}",
            unix_ts(),
            ctx.path.display(),
            stats.rows,
            stats.columns,
            stats.unparsable_values
        ));
    }

    fn on_missing_source(&self, ctx: &IngestionContext) {
        self.append_line(&format!(
            "{} missing path={}",
            unix_ts(),
            ctx.path.display()
        ));
    }

    fn on_failure(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} fail severity={:?} path={} err={}",
            unix_ts(),
            severity,
            ctx.path.display(),
            error
        ));
    }

    fn on_alert(&self, ctx: &IngestionContext, severity: IngestionSeverity, error: &IngestionError) {
        self.append_line(&format!(
            "{} ALERT severity={:?} path={} err={}",
            unix_ts(),
            severity,
            ctx.path.display(),
            error
        ));
    }
}

fn unix_ts() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
