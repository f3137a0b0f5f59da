//! Distribution summaries used for chart data (quality histogram, interaction box plots).

use serde::Serialize;

use crate::types::{DataSet, Value};

/// One equal-width histogram bin. `upper` is exclusive except for the last bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistogramBin {
    /// Inclusive lower edge.
    pub lower: f64,
    /// Upper edge.
    pub upper: f64,
    /// Values falling in the bin.
    pub count: usize,
}

/// Five-number summary of a numeric column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quartiles {
    /// Smallest value.
    pub min: f64,
    /// First quartile (25th percentile).
    pub q1: f64,
    /// Median (50th percentile).
    pub median: f64,
    /// Third quartile (75th percentile).
    pub q3: f64,
    /// Largest value.
    pub max: f64,
}

fn finite_values(dataset: &DataSet, column: &str) -> Vec<f64> {
    dataset
        .column(column)
        .map(|values| {
            values
                .filter_map(Value::as_f64)
                .filter(|v| v.is_finite())
                .collect()
        })
        .unwrap_or_default()
}

/// Split the numeric values of `column` into `bins` equal-width bins spanning `[min, max]`.
///
/// When every value is the same, the span is widened to `[v - 0.5, v + 0.5]`. Returns an empty
/// vector when there are no values or `bins == 0`.
pub fn histogram(dataset: &DataSet, column: &str, bins: usize) -> Vec<HistogramBin> {
    let values = finite_values(dataset, column);
    if values.is_empty() || bins == 0 {
        return Vec::new();
    }

    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if lo == hi {
        lo -= 0.5;
        hi += 0.5;
    }
    let width = (hi - lo) / bins as f64;

    let mut out: Vec<HistogramBin> = (0..bins)
        .map(|i| HistogramBin {
            lower: lo + width * i as f64,
            upper: if i + 1 == bins { hi } else { lo + width * (i + 1) as f64 },
            count: 0,
        })
        .collect();
    for v in values {
        let idx = (((v - lo) / width) as usize).min(bins - 1);
        out[idx].count += 1;
    }
    out
}

/// Min, quartiles and max of the numeric values of `column`, with linear interpolation
/// between closest ranks. `None` when there are no values.
pub fn quartiles(dataset: &DataSet, column: &str) -> Option<Quartiles> {
    let mut values = finite_values(dataset, column);
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);

    let at = |p: f64| {
        let pos = p * (values.len() - 1) as f64;
        let below = pos.floor() as usize;
        let above = pos.ceil() as usize;
        values[below] + (values[above] - values[below]) * (pos - below as f64)
    };

    Some(Quartiles {
        min: values[0],
        q1: at(0.25),
        median: at(0.5),
        q3: at(0.75),
        max: values[values.len() - 1],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DataType, Field, Schema};

    fn column_of(values: &[Option<f64>]) -> DataSet {
        DataSet::new(
            Schema::new(vec![Field::new("x", DataType::Float64)]),
            values
                .iter()
                .map(|v| vec![v.map(Value::Float64).unwrap_or(Value::Null)])
                .collect(),
        )
    }

    #[test]
    fn histogram_counts_every_value_once() {
        let ds = column_of(&[Some(0.0), Some(0.25), Some(0.5), Some(1.0), None]);
        let bins = histogram(&ds, "x", 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).collect::<Vec<_>>(), vec![1, 1, 1, 1]);
        assert_eq!(bins[0].lower, 0.0);
        assert_eq!(bins[3].upper, 1.0);
    }

    #[test]
    fn histogram_of_constant_column_widens_span() {
        let ds = column_of(&[Some(2.0), Some(2.0)]);
        let bins = histogram(&ds, "x", 2);
        assert_eq!(bins[0].lower, 1.5);
        assert_eq!(bins[1].upper, 2.5);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 2);
    }

    #[test]
    fn histogram_of_empty_column_is_empty() {
        assert!(histogram(&column_of(&[None]), "x", 20).is_empty());
        assert!(histogram(&column_of(&[Some(1.0)]), "x", 0).is_empty());
    }

    #[test]
    fn quartiles_interpolate() {
        let ds = column_of(&[Some(4.0), Some(1.0), Some(3.0), Some(2.0), None]);
        let q = quartiles(&ds, "x").unwrap();
        assert_eq!(q.min, 1.0);
        assert_eq!(q.q1, 1.75);
        assert_eq!(q.median, 2.5);
        assert_eq!(q.q3, 3.25);
        assert_eq!(q.max, 4.0);
        assert!(quartiles(&column_of(&[None]), "x").is_none());
    }
}
