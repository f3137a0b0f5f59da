//! Row-level cleaning policies.
//!
//! Loading never drops data. The destructive policy here exists for the batch report and must be
//! opted into explicitly.

use std::collections::HashSet;

use serde::Serialize;

use crate::types::{DataSet, Value};

/// What to do with duplicate and incomplete rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum CleaningPolicy {
    /// Keep every row as read.
    #[default]
    Preserve,
    /// Drop exact duplicate rows (keeping the first), then every row with a null in a column read
    /// from the source.
    DropDuplicatesAndIncomplete,
}

fn row_key(row: &[Value]) -> Vec<Option<String>> {
    row.iter().map(Value::as_text).collect()
}

/// Number of rows identical to an earlier row.
pub fn count_duplicate_rows(dataset: &DataSet) -> usize {
    let mut seen = HashSet::with_capacity(dataset.row_count());
    dataset.reduce_rows(0usize, |dups, row| {
        if seen.insert(row_key(row)) { dups } else { dups + 1 }
    })
}

/// Columns taken into account for completeness: every column except those named in
/// `synthesized`.
///
/// Pass the loader's synthesized columns (see
/// [`crate::ingestion::IngestionStats::synthesized_columns`]) so that an expected column missing
/// from the source does not make every row incomplete.
fn source_columns(dataset: &DataSet, synthesized: &[String]) -> Vec<usize> {
    dataset
        .schema
        .fields
        .iter()
        .enumerate()
        .filter(|(_, f)| !synthesized.iter().any(|s| *s == f.name))
        .map(|(i, _)| i)
        .collect()
}

/// Number of null cells in the source columns.
pub fn count_null_cells(dataset: &DataSet, synthesized: &[String]) -> usize {
    let columns = source_columns(dataset, synthesized);
    dataset.reduce_rows(0usize, |n, row| {
        n + columns.iter().filter(|&&i| row.get(i).is_some_and(Value::is_null)).count()
    })
}

/// Keep only the first occurrence of each distinct row.
pub fn drop_duplicate_rows(dataset: &DataSet) -> DataSet {
    let mut seen = HashSet::with_capacity(dataset.row_count());
    dataset.filter_rows(|row| seen.insert(row_key(row)))
}

/// Keep only rows without a null in any source column.
pub fn drop_incomplete_rows(dataset: &DataSet, synthesized: &[String]) -> DataSet {
    let columns = source_columns(dataset, synthesized);
    dataset.filter_rows(|row| !columns.iter().any(|&i| row.get(i).is_some_and(Value::is_null)))
}

/// Apply `policy`, returning a new dataset. Columns named in `synthesized` are ignored when
/// judging completeness.
pub fn apply_cleaning(dataset: &DataSet, policy: CleaningPolicy, synthesized: &[String]) -> DataSet {
    match policy {
        CleaningPolicy::Preserve => dataset.clone(),
        CleaningPolicy::DropDuplicatesAndIncomplete => {
            drop_incomplete_rows(&drop_duplicate_rows(dataset), synthesized)
        }
    }
}
