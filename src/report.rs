//! One-shot batch report over a session dataset.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use crate::processing::clean::{apply_cleaning, count_duplicate_rows, count_null_cells, CleaningPolicy};
use crate::processing::{
    column_stats, distinct_values, mean_by_group, session_counts_by_period, BucketCount, ColumnStats, SessionSummary,
    TimeBucket,
};
use crate::sessions;
use crate::types::{DataSet, DataType};

/// Name and inferred type of one column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnInfo {
    /// Column name.
    pub name: String,
    /// Declared or inferred type.
    pub data_type: DataType,
    /// Added by the loader because the source lacked it.
    pub synthesized: bool,
}

/// Per-service means of the main session measures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceMeans {
    /// Service name.
    pub service: String,
    /// Mean duration in minutes; `None` without data.
    pub mean_duree_minutes: Option<f64>,
    /// Mean practitioner rating.
    pub mean_note_praticien: Option<f64>,
    /// Mean quality score.
    pub mean_qualite_score: Option<f64>,
}

/// Shape, data-quality counts and aggregate figures for a dataset.
///
/// Counts of duplicates and nulls describe the input; everything from `cleaned_rows` on is
/// computed after `policy` has been applied. Null counts and the cleaning step only look at
/// columns read from the source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    /// Rows in the input.
    pub rows: usize,
    /// Input columns in order.
    pub columns: Vec<ColumnInfo>,
    /// Rows identical to an earlier row.
    pub duplicate_rows: usize,
    /// Null cells in source columns.
    pub null_cells: usize,
    /// Cleaning applied before the figures below.
    pub policy: CleaningPolicy,
    /// Rows left after cleaning.
    pub cleaned_rows: usize,
    /// Duplicates left after cleaning.
    pub remaining_duplicate_rows: usize,
    /// Null source cells left after cleaning.
    pub remaining_null_cells: usize,
    /// Headline means.
    pub summary: SessionSummary,
    /// Count, total and range of session durations.
    pub duration: ColumnStats,
    /// Means per service, services in ascending order.
    pub by_service: Vec<ServiceMeans>,
    /// Sessions per day, days without sessions omitted.
    pub daily_sessions: Vec<BucketCount>,
}

impl BatchReport {
    /// Build the report for `dataset`.
    ///
    /// `synthesized` names the columns the loader added as all-null (see
    /// [`crate::ingestion::IngestionStats::synthesized_columns`]); they are excluded from null
    /// counts and never make a row incomplete.
    pub fn build(dataset: &DataSet, policy: CleaningPolicy, synthesized: &[String]) -> Self {
        let cleaned = apply_cleaning(dataset, policy, synthesized);

        let means_of = |column: &str| -> HashMap<String, Option<f64>> {
            mean_by_group(&cleaned, sessions::SERVICE, column)
                .into_iter()
                .map(|g| (g.group, g.mean))
                .collect()
        };
        let duree = means_of(sessions::DUREE_MINUTES);
        let note = means_of(sessions::NOTE_PRATICIEN);
        let qualite = means_of(sessions::QUALITE_SCORE);
        let by_service = distinct_values(&cleaned, sessions::SERVICE)
            .into_iter()
            .map(|service| ServiceMeans {
                mean_duree_minutes: duree.get(&service).copied().flatten(),
                mean_note_praticien: note.get(&service).copied().flatten(),
                mean_qualite_score: qualite.get(&service).copied().flatten(),
                service,
            })
            .collect();

        Self {
            rows: dataset.row_count(),
            columns: dataset
                .schema
                .fields
                .iter()
                .map(|f| ColumnInfo {
                    name: f.name.clone(),
                    data_type: f.data_type,
                    synthesized: synthesized.contains(&f.name),
                })
                .collect(),
            duplicate_rows: count_duplicate_rows(dataset),
            null_cells: count_null_cells(dataset, synthesized),
            policy,
            cleaned_rows: cleaned.row_count(),
            remaining_duplicate_rows: count_duplicate_rows(&cleaned),
            remaining_null_cells: count_null_cells(&cleaned, synthesized),
            summary: SessionSummary::from_dataset(&cleaned),
            duration: column_stats(&cleaned, sessions::DUREE_MINUTES),
            by_service,
            daily_sessions: session_counts_by_period(&cleaned, TimeBucket::Day),
        }
    }
}

struct Metric(Option<f64>);

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(v) => write!(f, "{v:.2}"),
            None => f.write_str("no data"),
        }
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Dataset: {} rows, {} columns", self.rows, self.columns.len())?;
        writeln!(f)?;
        writeln!(f, "Column types:")?;
        for c in &self.columns {
            if c.synthesized {
                writeln!(f, "  {:<28} {:?} (missing from source)", c.name, c.data_type)?;
            } else {
                writeln!(f, "  {:<28} {:?}", c.name, c.data_type)?;
            }
        }
        writeln!(f)?;
        writeln!(f, "Duplicate rows: {}", self.duplicate_rows)?;
        writeln!(f, "Missing values: {}", self.null_cells)?;
        writeln!(f, "Cleaning policy: {:?}", self.policy)?;
        writeln!(
            f,
            "After cleaning: {} rows ({} duplicates, {} missing values remaining)",
            self.cleaned_rows, self.remaining_duplicate_rows, self.remaining_null_cells
        )?;
        writeln!(f)?;

        writeln!(f, "Means by service:")?;
        writeln!(f, "  {:<24} {:>14} {:>14} {:>14}", "service", "duree_minutes", "note_praticien", "qualite_score")?;
        for s in &self.by_service {
            writeln!(
                f,
                "  {:<24} {:>14} {:>14} {:>14}",
                s.service,
                Metric(s.mean_duree_minutes).to_string(),
                Metric(s.mean_note_praticien).to_string(),
                Metric(s.mean_qualite_score).to_string()
            )?;
        }
        writeln!(f)?;

        let s = &self.summary;
        writeln!(f, "Mean session duration: {}", Metric(s.mean_duree_minutes))?;
        let d = &self.duration;
        writeln!(
            f,
            "Durations: {} recorded, total {}, min {}, max {}",
            d.count,
            Metric(d.sum),
            Metric(d.min),
            Metric(d.max)
        )?;
        writeln!(f)?;
        writeln!(f, "Sessions per day:")?;
        for b in &self.daily_sessions {
            writeln!(f, "  {}  {}", b.bucket, b.count)?;
        }
        writeln!(f)?;
        writeln!(f, "Mean interactions:")?;
        writeln!(f, "  patient     {}", Metric(s.mean_interactions_patient))?;
        writeln!(f, "  praticien   {}", Metric(s.mean_interactions_praticien))?;
        writeln!(f)?;
        writeln!(f, "Quality indicators:")?;
        writeln!(f, "  note_praticien          {}", Metric(s.mean_note_praticien))?;
        writeln!(f, "  qualite_score           {}", Metric(s.mean_qualite_score))?;
        write!(f, "  segments_non_reconnus   {}", Metric(s.mean_segments_non_reconnus))
    }
}
