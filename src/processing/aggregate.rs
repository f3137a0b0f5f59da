//! Summary statistics and grouped breakdowns over session subsets.
//!
//! Every function accepts an empty dataset. Means are `Option<f64>`: `None` means there was no
//! non-null value to average, never zero.

use std::collections::{BTreeMap, HashMap};

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::Serialize;

use crate::sessions;
use crate::types::{DataSet, Value};

use super::reduce::{reduce, ReduceOp};

/// Mean of a column, skipping nulls and non-numeric values.
///
/// `None` if the column is absent or holds no numeric value.
pub fn mean(dataset: &DataSet, column: &str) -> Option<f64> {
    as_metric(reduce(dataset, column, ReduceOp::Mean))
}

fn as_metric(value: Option<Value>) -> Option<f64> {
    match value? {
        Value::Float64(v) => Some(v),
        _ => None,
    }
}

/// Count, total and range of one numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColumnStats {
    /// Number of numeric values; nulls and unparsable cells are not counted.
    pub count: usize,
    /// Total of the values.
    pub sum: Option<f64>,
    /// Smallest value.
    pub min: Option<f64>,
    /// Largest value.
    pub max: Option<f64>,
    /// Arithmetic mean.
    pub mean: Option<f64>,
}

/// [`ColumnStats`] of `column`, built from the [`ReduceOp`]s.
///
/// An absent column gives a zero count and no figures.
pub fn column_stats(dataset: &DataSet, column: &str) -> ColumnStats {
    let count = match reduce(dataset, column, ReduceOp::Count) {
        Some(Value::Int64(n)) => usize::try_from(n).unwrap_or(0),
        _ => 0,
    };
    ColumnStats {
        count,
        sum: as_metric(reduce(dataset, column, ReduceOp::Sum)),
        min: as_metric(reduce(dataset, column, ReduceOp::Min)),
        max: as_metric(reduce(dataset, column, ReduceOp::Max)),
        mean: as_metric(reduce(dataset, column, ReduceOp::Mean)),
    }
}

/// Headline metrics for a subset.
///
/// Each mean is `None` when the subset has no numeric value in that column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    /// Number of sessions (rows), whatever their content.
    pub sessions: usize,
    /// Mean session duration in minutes.
    pub mean_duree_minutes: Option<f64>,
    /// Mean practitioner rating.
    pub mean_note_praticien: Option<f64>,
    /// Mean quality score.
    pub mean_qualite_score: Option<f64>,
    /// Mean number of unrecognized segments.
    pub mean_segments_non_reconnus: Option<f64>,
    /// Mean number of patient interactions.
    pub mean_interactions_patient: Option<f64>,
    /// Mean number of practitioner interactions.
    pub mean_interactions_praticien: Option<f64>,
}

impl SessionSummary {
    /// Compute the summary of `dataset`. Never fails; an empty dataset gives zero sessions and
    /// no means.
    pub fn from_dataset(dataset: &DataSet) -> Self {
        Self {
            sessions: dataset.row_count(),
            mean_duree_minutes: mean(dataset, sessions::DUREE_MINUTES),
            mean_note_praticien: mean(dataset, sessions::NOTE_PRATICIEN),
            mean_qualite_score: mean(dataset, sessions::QUALITE_SCORE),
            mean_segments_non_reconnus: mean(dataset, sessions::SEGMENTS_NON_RECONNUS),
            mean_interactions_patient: mean(dataset, sessions::INTERACTIONS_PATIENT),
            mean_interactions_praticien: mean(dataset, sessions::INTERACTIONS_PRATICIEN),
        }
    }
}

/// One row of a frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValueCount {
    /// The value, rendered as text.
    pub value: String,
    /// Number of rows holding it.
    pub count: usize,
}

/// Frequency of each non-null value of `column`, most frequent first.
///
/// Ties keep the order in which values first appear.
pub fn value_counts(dataset: &DataSet, column: &str) -> Vec<ValueCount> {
    let Some(values) = dataset.column(column) else {
        return Vec::new();
    };

    let mut out: Vec<ValueCount> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();
    for value in values.filter_map(Value::as_text) {
        match positions.get(&value) {
            Some(&pos) => out[pos].count += 1,
            None => {
                positions.insert(value.clone(), out.len());
                out.push(ValueCount { value, count: 1 });
            }
        }
    }
    out.sort_by(|a, b| b.count.cmp(&a.count));
    out
}

/// Mean of one column within one group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMean {
    /// Group value, rendered as text.
    pub group: String,
    /// `None` when every value in the group is missing.
    pub mean: Option<f64>,
}

/// Mean of `value_column` per distinct non-null `group_column` value, highest mean first.
///
/// Groups without data sort last; ties keep ascending group order.
pub fn mean_by_group(dataset: &DataSet, group_column: &str, value_column: &str) -> Vec<GroupMean> {
    let (Some(g), Some(v)) = (
        dataset.schema.index_of(group_column),
        dataset.schema.index_of(value_column),
    ) else {
        return Vec::new();
    };

    let sums = dataset.reduce_rows(BTreeMap::<String, (f64, usize)>::new(), |mut acc, row| {
        if let Some(group) = row.get(g).and_then(Value::as_text) {
            let entry = acc.entry(group).or_insert((0.0, 0));
            if let Some(x) = row.get(v).and_then(Value::as_f64) {
                entry.0 += x;
                entry.1 += 1;
            }
        }
        acc
    });

    let mut out: Vec<GroupMean> = sums
        .into_iter()
        .map(|(group, (sum, n))| GroupMean {
            group,
            mean: (n > 0).then(|| sum / n as f64),
        })
        .collect();
    out.sort_by(|a, b| match (a.mean, b.mean) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    });
    out
}

/// Time granularity for session counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeBucket {
    /// Calendar day.
    Day,
    /// Week starting on Monday.
    Week,
    /// Calendar month.
    Month,
}

impl TimeBucket {
    /// First day of the bucket containing `date`.
    pub fn start_of(self, date: NaiveDate) -> NaiveDate {
        match self {
            TimeBucket::Day => date,
            TimeBucket::Week => date - Days::new(u64::from(date.weekday().num_days_from_monday())),
            TimeBucket::Month => date.with_day(1).unwrap_or(date),
        }
    }

    /// First day of the bucket following the one starting at `start`.
    fn next(self, start: NaiveDate) -> Option<NaiveDate> {
        match self {
            TimeBucket::Day => start.succ_opt(),
            TimeBucket::Week => start.checked_add_days(Days::new(7)),
            TimeBucket::Month => start.checked_add_months(Months::new(1)),
        }
    }
}

/// Number of sessions in one time bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BucketCount {
    /// First day of the bucket.
    pub bucket: NaiveDate,
    /// Sessions dated within the bucket.
    pub count: usize,
}

/// Session counts per time bucket, oldest first. Rows without a date are not counted.
///
/// Day buckets only list days that have sessions. Week and month buckets cover the whole span
/// from the first to the last bucket, with zero counts for empty ones.
pub fn session_counts_by_period(dataset: &DataSet, bucket: TimeBucket) -> Vec<BucketCount> {
    let mut counts: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    if let Some(dates) = dataset.column(sessions::DATE) {
        for date in dates.filter_map(Value::as_date) {
            *counts.entry(bucket.start_of(date)).or_insert(0) += 1;
        }
    }

    if bucket != TimeBucket::Day {
        if let (Some(&first), Some(&last)) = (counts.keys().next(), counts.keys().next_back()) {
            let mut cur = first;
            while cur < last {
                counts.entry(cur).or_insert(0);
                match bucket.next(cur) {
                    Some(next) => cur = next,
                    None => break,
                }
            }
        }
    }

    counts
        .into_iter()
        .map(|(bucket, count)| BucketCount { bucket, count })
        .collect()
}

/// Numeric note columns with identifying columns, most recent session first.
///
/// `None` when the dataset has no numeric column whose name contains `note`.
pub fn note_score_table(dataset: &DataSet) -> Option<DataSet> {
    let mut columns: Vec<&str> = dataset
        .schema
        .fields
        .iter()
        .filter(|f| f.name.contains(sessions::NOTE_MARKER) && f.data_type.is_numeric())
        .map(|f| f.name.as_str())
        .collect();
    if columns.is_empty() {
        return None;
    }
    columns.extend([sessions::SESSION_ID, sessions::SERVICE, sessions::DATE]);
    Some(dataset.select(&columns).sort_by_column_desc(sessions::DATE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field, Schema};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn text(s: &str) -> Value {
        Value::Utf8(s.to_string())
    }

    fn at(date: NaiveDate) -> Value {
        Value::DateTime(date.and_hms_opt(14, 30, 0).unwrap())
    }

    fn dataset() -> DataSet {
        DataSet::new(
            Schema::new(vec![
                Field::new("session_id", DataType::Int64),
                Field::new("date", DataType::DateTime),
                Field::new("service", DataType::Utf8),
                Field::new("langue", DataType::Utf8),
                Field::new("duree_minutes", DataType::Float64),
                Field::new("note_praticien", DataType::Float64),
            ]),
            vec![
                vec![Value::Int64(1), at(d(2024, 1, 1)), text("Urgences"), text("arabe"), Value::Float64(10.0), Value::Float64(4.0)],
                vec![Value::Int64(2), at(d(2024, 1, 1)), text("Pédiatrie"), text("anglais"), Value::Float64(30.0), Value::Null],
                vec![Value::Int64(3), at(d(2024, 1, 17)), text("Urgences"), text("anglais"), Value::Float64(20.0), Value::Float64(5.0)],
                vec![Value::Int64(4), at(d(2024, 3, 3)), Value::Null, text("tamoul"), Value::Null, Value::Float64(3.0)],
                vec![Value::Int64(5), Value::Null, text("Oncologie"), Value::Null, Value::Null, Value::Null],
            ],
        )
    }

    #[test]
    fn summary_means_skip_nulls() {
        let s = SessionSummary::from_dataset(&dataset());
        assert_eq!(s.sessions, 5);
        assert_eq!(s.mean_duree_minutes, Some(20.0));
        assert_eq!(s.mean_note_praticien, Some(4.0));
        // Column absent from this dataset.
        assert_eq!(s.mean_qualite_score, None);
    }

    #[test]
    fn summary_of_empty_subset_has_no_data() {
        let empty = DataSet::new(dataset().schema, vec![]);
        let s = SessionSummary::from_dataset(&empty);
        assert_eq!(s.sessions, 0);
        assert_eq!(s.mean_duree_minutes, None);
        assert_eq!(s.mean_note_praticien, None);
    }

    #[test]
    fn column_stats_cover_count_range_and_total() {
        let stats = column_stats(&dataset(), "duree_minutes");
        assert_eq!(
            stats,
            ColumnStats {
                count: 3,
                sum: Some(60.0),
                min: Some(10.0),
                max: Some(30.0),
                mean: Some(20.0),
            }
        );

        let absent = column_stats(&dataset(), "qualite_score");
        assert_eq!(absent.count, 0);
        assert_eq!(absent.sum, None);
        assert_eq!(absent.mean, None);
    }

    #[test]
    fn value_counts_are_descending_with_stable_ties() {
        let counts = value_counts(&dataset(), "langue");
        assert_eq!(
            counts,
            vec![
                ValueCount { value: "anglais".to_string(), count: 2 },
                ValueCount { value: "arabe".to_string(), count: 1 },
                ValueCount { value: "tamoul".to_string(), count: 1 },
            ]
        );
        assert!(value_counts(&dataset(), "missing").is_empty());
    }

    #[test]
    fn mean_by_group_sorts_descending_and_puts_no_data_last() {
        let out = mean_by_group(&dataset(), "service", "duree_minutes");
        assert_eq!(
            out,
            vec![
                GroupMean { group: "Pédiatrie".to_string(), mean: Some(30.0) },
                GroupMean { group: "Urgences".to_string(), mean: Some(15.0) },
                GroupMean { group: "Oncologie".to_string(), mean: None },
            ]
        );
    }

    #[test]
    fn week_starts_on_monday() {
        // 2024-01-17 is a Wednesday.
        assert_eq!(TimeBucket::Week.start_of(d(2024, 1, 17)), d(2024, 1, 15));
        assert_eq!(TimeBucket::Week.start_of(d(2024, 1, 15)), d(2024, 1, 15));
        assert_eq!(TimeBucket::Week.start_of(d(2024, 1, 14)), d(2024, 1, 8));
        assert_eq!(TimeBucket::Month.start_of(d(2024, 2, 29)), d(2024, 2, 1));
    }

    #[test]
    fn daily_counts_are_sparse() {
        let out = session_counts_by_period(&dataset(), TimeBucket::Day);
        assert_eq!(
            out,
            vec![
                BucketCount { bucket: d(2024, 1, 1), count: 2 },
                BucketCount { bucket: d(2024, 1, 17), count: 1 },
                BucketCount { bucket: d(2024, 3, 3), count: 1 },
            ]
        );
    }

    #[test]
    fn monthly_counts_fill_gaps() {
        let out = session_counts_by_period(&dataset(), TimeBucket::Month);
        assert_eq!(
            out,
            vec![
                BucketCount { bucket: d(2024, 1, 1), count: 3 },
                BucketCount { bucket: d(2024, 2, 1), count: 0 },
                BucketCount { bucket: d(2024, 3, 1), count: 1 },
            ]
        );
    }

    #[test]
    fn weekly_counts_fill_gaps() {
        let out = session_counts_by_period(&dataset(), TimeBucket::Week);
        // 2024-01-01 is a Monday; 2024-03-03 is a Sunday in the week of 2024-02-26.
        assert_eq!(out.first(), Some(&BucketCount { bucket: d(2024, 1, 1), count: 2 }));
        assert_eq!(out.last(), Some(&BucketCount { bucket: d(2024, 2, 26), count: 1 }));
        assert_eq!(out.len(), 9);
        assert_eq!(out.iter().map(|b| b.count).sum::<usize>(), 4);
    }

    #[test]
    fn counts_of_empty_subset_are_empty() {
        let empty = DataSet::new(dataset().schema, vec![]);
        assert!(session_counts_by_period(&empty, TimeBucket::Month).is_empty());
    }

    #[test]
    fn note_table_sorts_by_most_recent() {
        let table = note_score_table(&dataset()).unwrap();
        assert_eq!(
            table.schema.field_names().collect::<Vec<_>>(),
            vec!["note_praticien", "session_id", "service", "date"]
        );
        let ids: Vec<_> = table.column("session_id").unwrap().cloned().collect();
        assert_eq!(
            ids,
            vec![Value::Int64(4), Value::Int64(3), Value::Int64(1), Value::Int64(2), Value::Int64(5)]
        );
    }

    #[test]
    fn note_table_needs_numeric_note_column() {
        let ds = dataset().select(&["session_id", "service"]);
        assert!(note_score_table(&ds).is_none());
    }
}
