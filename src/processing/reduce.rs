//! Reduction operations for [`crate::types::DataSet`].

use crate::types::{DataSet, Value};

/// Built-in reduction operations over a single column.
///
/// Values are coerced with [`Value::as_f64`]; nulls, NaN and non-numeric cells are skipped by
/// every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReduceOp {
    /// Number of numeric values.
    Count,
    /// Sum of numeric values.
    Sum,
    /// Minimum numeric value.
    Min,
    /// Maximum numeric value.
    Max,
    /// Arithmetic mean.
    Mean,
}

#[derive(Debug, Clone, Copy)]
struct Accumulator {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Accumulator {
    const EMPTY: Self = Self {
        count: 0,
        sum: 0.0,
        min: f64::INFINITY,
        max: f64::NEG_INFINITY,
    };

    fn push(self, v: f64) -> Self {
        Self {
            count: self.count + 1,
            sum: self.sum + v,
            min: self.min.min(v),
            max: self.max.max(v),
        }
    }
}

/// Reduce a column using a built-in [`ReduceOp`].
///
/// - Returns `None` if `column` does not exist in the schema.
/// - `Count` returns `Some(Value::Int64(n))`, zero included.
/// - `Sum`/`Min`/`Max`/`Mean` return `Some(Value::Float64(_))`, or `Some(Value::Null)` when the
///   column holds no numeric value.
pub fn reduce(dataset: &DataSet, column: &str, op: ReduceOp) -> Option<Value> {
    let idx = dataset.schema.index_of(column)?;
    let acc = dataset.reduce_rows(Accumulator::EMPTY, |acc, row| {
        match row.get(idx).and_then(Value::as_f64) {
            Some(v) => acc.push(v),
            None => acc,
        }
    });

    if op == ReduceOp::Count {
        return Some(Value::Int64(i64::try_from(acc.count).unwrap_or(i64::MAX)));
    }
    if acc.count == 0 {
        return Some(Value::Null);
    }
    let v = match op {
        ReduceOp::Sum => acc.sum,
        ReduceOp::Min => acc.min,
        ReduceOp::Max => acc.max,
        ReduceOp::Mean | ReduceOp::Count => acc.sum / acc.count as f64,
    };
    Some(Value::Float64(v))
}
