//! Row filtering for [`crate::types::DataSet`].

use std::collections::BTreeSet;

use crate::sessions;
use crate::types::{DataSet, DataType, Value};

use super::date_range::DateRange;

/// Returns a new [`DataSet`] containing only rows for which `predicate` returns `true`.
///
/// This is a convenience wrapper around [`DataSet::filter_rows`].
pub fn filter<F>(dataset: &DataSet, predicate: F) -> DataSet
where
    F: FnMut(&[Value]) -> bool,
{
    dataset.filter_rows(predicate)
}

/// User-selected constraints over session rows.
///
/// Every field is optional; an absent field (or an empty set/string) does not constrain
/// anything. Active fields are combined with logical AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterCriteria {
    /// Inclusive calendar-date bounds on the `date` column.
    pub date_range: Option<DateRange>,
    /// Allowed `service` values.
    pub services: Option<BTreeSet<String>>,
    /// Allowed `langue` values.
    pub langues: Option<BTreeSet<String>>,
    /// Minimum `note_praticien`.
    pub min_note: Option<f64>,
    /// Minimum `qualite_score`.
    pub min_qualite: Option<f64>,
    /// Exact `device` value.
    pub device: Option<String>,
    /// Case-insensitive substring searched in text note columns.
    pub query: Option<String>,
}

impl FilterCriteria {
    /// Criteria that keep every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep rows whose calendar date lies in `range` (inclusive). Validate it first with
    /// [`super::validate_date_range`].
    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    /// Keep rows whose `service` is one of `services`. An empty list constrains nothing.
    pub fn with_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.services = Some(services.into_iter().map(Into::into).collect());
        self
    }

    /// Keep rows whose `langue` is one of `langues`. An empty list constrains nothing.
    pub fn with_langues<I, S>(mut self, langues: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.langues = Some(langues.into_iter().map(Into::into).collect());
        self
    }

    /// Keep rows with `note_praticien >= min`.
    pub fn with_min_note(mut self, min: f64) -> Self {
        self.min_note = Some(min);
        self
    }

    /// Keep rows with `qualite_score >= min`.
    pub fn with_min_qualite(mut self, min: f64) -> Self {
        self.min_qualite = Some(min);
        self
    }

    /// Keep rows whose `device` equals `device` exactly.
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = Some(device.into());
        self
    }

    /// Keep rows where some text note column contains `query`, ignoring case.
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    /// `true` when no field constrains anything.
    pub fn is_unconstrained(&self) -> bool {
        self.date_range.is_none()
            && active_set(&self.services).is_none()
            && active_set(&self.langues).is_none()
            && self.min_note.is_none()
            && self.min_qualite.is_none()
            && active_str(&self.device).is_none()
            && active_str(&self.query).is_none()
    }
}

fn active_set(set: &Option<BTreeSet<String>>) -> Option<&BTreeSet<String>> {
    set.as_ref().filter(|s| !s.is_empty())
}

fn active_str(s: &Option<String>) -> Option<&str> {
    s.as_deref().filter(|s| !s.is_empty())
}

/// Indices of the free-text note columns: name contains `note` and the column is typed text.
///
/// Numeric rating columns such as `note_praticien` are excluded. The result depends only on the
/// schema, so it is the same for a dataset and any subset filtered from it.
pub fn text_note_columns(dataset: &DataSet) -> Vec<usize> {
    dataset
        .schema
        .fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.name.contains(sessions::NOTE_MARKER) && f.data_type == DataType::Utf8)
        .map(|(i, _)| i)
        .collect()
}

/// Apply `criteria` to `dataset`, returning the matching rows in their original order.
///
/// - date range: the row's calendar date (time of day ignored) must fall within the bounds;
///   null dates never match.
/// - service/language: the value must be in the set; nulls never match.
/// - minimum note/quality: the value is coerced to a number; missing or non-numeric values fail.
/// - device: exact equality.
/// - query: matches if any text note column contains it, ignoring case. Ignored entirely when
///   the dataset has no text note column.
///
/// Unconstrained criteria and empty datasets return an unchanged copy.
pub fn filter_sessions(dataset: &DataSet, criteria: &FilterCriteria) -> DataSet {
    if dataset.is_empty() || criteria.is_unconstrained() {
        return dataset.clone();
    }

    let idx = |name: &str| dataset.schema.index_of(name);
    let date_idx = idx(sessions::DATE);
    let service_idx = idx(sessions::SERVICE);
    let langue_idx = idx(sessions::LANGUE);
    let note_idx = idx(sessions::NOTE_PRATICIEN);
    let qualite_idx = idx(sessions::QUALITE_SCORE);
    let device_idx = idx(sessions::DEVICE);

    let services = active_set(&criteria.services);
    let langues = active_set(&criteria.langues);
    let device = active_str(&criteria.device);
    let text_columns = text_note_columns(dataset);
    let needle = active_str(&criteria.query)
        .filter(|_| !text_columns.is_empty())
        .map(str::to_lowercase);

    filter(dataset, |row| {
        if let Some(range) = criteria.date_range {
            if !cell(row, date_idx).and_then(Value::as_date).is_some_and(|d| range.contains(d)) {
                return false;
            }
        }
        if let Some(set) = services {
            if !is_member(row, service_idx, set) {
                return false;
            }
        }
        if let Some(set) = langues {
            if !is_member(row, langue_idx, set) {
                return false;
            }
        }
        if let Some(min) = criteria.min_note {
            if !at_least(row, note_idx, min) {
                return false;
            }
        }
        if let Some(min) = criteria.min_qualite {
            if !at_least(row, qualite_idx, min) {
                return false;
            }
        }
        if let Some(device) = device {
            if cell(row, device_idx).and_then(Value::as_text).as_deref() != Some(device) {
                return false;
            }
        }
        if let Some(needle) = &needle {
            let found = text_columns.iter().any(|&i| {
                cell(row, Some(i))
                    .and_then(Value::as_text)
                    .is_some_and(|text| text.to_lowercase().contains(needle.as_str()))
            });
            if !found {
                return false;
            }
        }
        true
    })
}

/// Sorted distinct non-null values of a column, as shown in selectors.
pub fn distinct_values(dataset: &DataSet, column: &str) -> Vec<String> {
    dataset
        .column(column)
        .map(|values| values.filter_map(Value::as_text).collect::<BTreeSet<_>>())
        .unwrap_or_default()
        .into_iter()
        .collect()
}

fn cell(row: &[Value], idx: Option<usize>) -> Option<&Value> {
    idx.and_then(|i| row.get(i))
}

fn is_member(row: &[Value], idx: Option<usize>, set: &BTreeSet<String>) -> bool {
    cell(row, idx)
        .and_then(Value::as_text)
        .is_some_and(|v| set.contains(&v))
}

fn at_least(row: &[Value], idx: Option<usize>, min: f64) -> bool {
    cell(row, idx).and_then(Value::as_f64).is_some_and(|v| v >= min)
}
