//! CSV ingestion implementation.

use std::collections::HashSet;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::error::{IngestionError, IngestionResult};
use crate::sessions;
use crate::types::{DataSet, DataType, Field, Schema, Value};

/// Cell contents treated as missing values.
pub const DEFAULT_NULL_MARKERS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "<NA>"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Options controlling how CSV cells are typed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvReadOptions {
    /// Columns parsed as timestamps. Cells that fail to parse become [`Value::Null`].
    pub date_columns: Vec<String>,
    /// Cell contents that map to [`Value::Null`], compared after trimming whitespace.
    pub null_markers: Vec<String>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            date_columns: vec![sessions::DATE.to_string()],
            null_markers: DEFAULT_NULL_MARKERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CsvReadOptions {
    fn is_null_marker(&self, raw: &str) -> bool {
        self.null_markers.iter().any(|m| m == raw)
    }

    fn is_date_column(&self, name: &str) -> bool {
        self.date_columns.iter().any(|c| c == name)
    }
}

/// Result of reading one CSV source.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvIngestion {
    /// The ingested table, columns in header order.
    pub dataset: DataSet,
    /// Number of non-empty cells that failed type coercion and were replaced by null.
    pub unparsable_values: usize,
}

/// Ingest a CSV file into an in-memory [`DataSet`].
///
/// Rules:
///
/// - CSV must have headers; every header becomes a column, in order.
/// - Column names must be unique.
/// - Date columns (see [`CsvReadOptions::date_columns`]) are parsed into timestamps.
/// - Every other column gets the narrowest type that fits all of its non-null cells:
///   `Int64`, then `Float64`, then `Bool`, else `Utf8`. A column with no values at all is typed
///   `Float64`.
/// - Short records are padded with nulls.
pub fn ingest_csv_from_path(path: impl AsRef<Path>, options: &CsvReadOptions) -> IngestionResult<CsvIngestion> {
    let mut rdr = reader_builder().from_path(path)?;
    ingest_csv_from_reader(&mut rdr, options)
}

/// Reader configuration shared by every CSV entrypoint: headers required, ragged rows allowed.
pub(crate) fn reader_builder() -> csv::ReaderBuilder {
    let mut builder = csv::ReaderBuilder::new();
    builder.has_headers(true).flexible(true);
    builder
}

/// Ingest CSV data from an existing CSV reader.
pub fn ingest_csv_from_reader<R: std::io::Read>(
    rdr: &mut csv::Reader<R>,
    options: &CsvReadOptions,
) -> IngestionResult<CsvIngestion> {
    let headers = rdr.headers()?.clone();

    let mut seen = HashSet::with_capacity(headers.len());
    for h in headers.iter() {
        if !seen.insert(h) {
            return Err(IngestionError::SchemaMismatch {
                message: format!(
                    "duplicate column '{h}'. headers={:?}",
                    headers.iter().collect::<Vec<_>>()
                ),
            });
        }
    }

    // Column-major raw cells; typing needs to see a whole column first.
    let mut raw_columns: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for result in rdr.records() {
        let record = result?;
        for (idx, column) in raw_columns.iter_mut().enumerate() {
            // Surrounding whitespace is kept in text; only the null check and typing ignore it.
            let raw = record.get(idx).unwrap_or("");
            column.push((!options.is_null_marker(raw.trim())).then(|| raw.to_owned()));
        }
    }

    let row_count = raw_columns.first().map_or(0, Vec::len);
    let mut unparsable_values = 0usize;
    let mut fields = Vec::with_capacity(headers.len());
    let mut columns = Vec::with_capacity(headers.len());

    for (name, raw) in headers.iter().zip(raw_columns) {
        let (data_type, values) = if options.is_date_column(name) {
            let (values, failed) = parse_date_column(raw);
            unparsable_values += failed;
            (DataType::DateTime, values)
        } else {
            infer_column(raw)
        };
        fields.push(Field::new(name, data_type));
        columns.push(values);
    }

    let mut rows: Vec<Vec<Value>> = (0..row_count)
        .map(|_| Vec::with_capacity(fields.len()))
        .collect();
    for column in columns {
        for (row, value) in rows.iter_mut().zip(column) {
            row.push(value);
        }
    }

    Ok(CsvIngestion {
        dataset: DataSet::new(Schema::new(fields), rows),
        unparsable_values,
    })
}

/// Parse a timestamp the way the session exports write them.
///
/// Accepts ISO dates with optional time of day, RFC 3339 (offset dropped), `YYYY/MM/DD` and
/// month-first `MM/DD/YYYY`. Bare dates become midnight.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_date_column(raw: Vec<Option<String>>) -> (Vec<Value>, usize) {
    let mut failed = 0usize;
    let values = raw
        .into_iter()
        .map(|cell| match cell {
            None => Value::Null,
            Some(s) => match parse_timestamp(&s) {
                Some(dt) => Value::DateTime(dt),
                None => {
                    failed += 1;
                    Value::Null
                }
            },
        })
        .collect();
    (values, failed)
}

fn infer_column(raw: Vec<Option<String>>) -> (DataType, Vec<Value>) {
    let data_type = {
        let mut present = raw.iter().flatten().peekable();
        if present.peek().is_none() {
            DataType::Float64
        } else if raw.iter().flatten().all(|s| s.trim().parse::<i64>().is_ok()) {
            DataType::Int64
        } else if raw.iter().flatten().all(|s| s.trim().parse::<f64>().is_ok()) {
            DataType::Float64
        } else if raw.iter().flatten().all(|s| parse_bool(s).is_some()) {
            DataType::Bool
        } else {
            DataType::Utf8
        }
    };

    let values = raw
        .into_iter()
        .map(|cell| match cell {
            None => Value::Null,
            Some(s) => typed_value(data_type, s),
        })
        .collect();
    (data_type, values)
}

fn typed_value(data_type: DataType, raw: String) -> Value {
    let trimmed = raw.trim();
    let parsed = match data_type {
        DataType::Int64 => trimmed.parse::<i64>().ok().map(Value::Int64),
        DataType::Float64 => trimmed.parse::<f64>().ok().map(Value::Float64),
        DataType::Bool => parse_bool(trimmed).map(Value::Bool),
        _ => None,
    };
    parsed.unwrap_or(Value::Utf8(raw))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn ingest(input: &str) -> CsvIngestion {
        let mut rdr = reader_builder().from_reader(input.as_bytes());
        ingest_csv_from_reader(&mut rdr, &CsvReadOptions::default()).unwrap()
    }

    #[test]
    fn infers_column_types() {
        let out = ingest("id,duree,flag,service\n1,12.5,true,Urgences\n2,,False,Pédiatrie\n");
        let types: Vec<_> = out.dataset.schema.fields.iter().map(|f| f.data_type).collect();
        assert_eq!(
            types,
            vec![DataType::Int64, DataType::Float64, DataType::Bool, DataType::Utf8]
        );
        assert_eq!(out.dataset.rows[1][1], Value::Null);
        assert_eq!(out.dataset.rows[1][2], Value::Bool(false));
    }

    #[test]
    fn mixed_numeric_and_text_falls_back_to_utf8() {
        let out = ingest("note_praticien\n4.5\nbien\n");
        assert_eq!(out.dataset.schema.fields[0].data_type, DataType::Utf8);
        assert_eq!(out.dataset.rows[0][0], Value::Utf8("4.5".to_string()));
    }

    #[test]
    fn text_keeps_surrounding_whitespace_but_numbers_are_typed() {
        let out = ingest("commentaire,duree,flag\n  garder les espaces  , 12 , true\n   ,3,false\n");
        let types: Vec<_> = out.dataset.schema.fields.iter().map(|f| f.data_type).collect();
        assert_eq!(types, vec![DataType::Utf8, DataType::Int64, DataType::Bool]);
        assert_eq!(out.dataset.rows[0][0], Value::Utf8("  garder les espaces  ".to_string()));
        assert_eq!(out.dataset.rows[0][1], Value::Int64(12));
        assert_eq!(out.dataset.rows[0][2], Value::Bool(true));
        // Blank cells are still missing values.
        assert_eq!(out.dataset.rows[1][0], Value::Null);
    }

    #[test]
    fn all_null_column_is_float() {
        let out = ingest("a,b\n1,\n2,NA\n");
        assert_eq!(out.dataset.schema.fields[1].data_type, DataType::Float64);
    }

    #[test]
    fn unparsable_dates_become_null_and_are_counted() {
        let out = ingest("date,x\n2024-01-05 10:30:00,1\nhier,2\n,3\n");
        let d = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_hms_opt(10, 30, 0).unwrap();
        assert_eq!(out.dataset.rows[0][0], Value::DateTime(d));
        assert_eq!(out.dataset.rows[1][0], Value::Null);
        assert_eq!(out.dataset.rows[2][0], Value::Null);
        assert_eq!(out.unparsable_values, 1);
    }

    #[test]
    fn short_records_are_padded() {
        let out = ingest("a,b,c\n1,2\n");
        assert_eq!(out.dataset.rows[0].len(), 3);
        assert_eq!(out.dataset.rows[0][2], Value::Null);
    }

    #[test]
    fn duplicate_headers_are_rejected() {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader("a,a\n1,2\n".as_bytes());
        let err = ingest_csv_from_reader(&mut rdr, &CsvReadOptions::default()).unwrap_err();
        assert!(err.to_string().contains("duplicate column 'a'"));
    }

    #[test]
    fn parse_timestamp_accepts_common_layouts() {
        let midnight = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2024-03-02"), Some(midnight));
        assert_eq!(parse_timestamp("2024/03/02"), Some(midnight));
        assert_eq!(parse_timestamp("03/02/2024"), Some(midnight));
        assert_eq!(
            parse_timestamp("2024-03-02T08:15:00+02:00"),
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap().and_hms_opt(8, 15, 0)
        );
        assert_eq!(parse_timestamp("not a date"), None);
    }
}
