//! Display formatting and CSV export of session subsets.

use std::io::Write;

use crate::error::ExportError;
use crate::types::{DataSet, DataType, Value};

/// Copy of `dataset` with every timestamp column reduced to a calendar date.
///
/// Apply this wherever a subset is shown to a user, not only on export.
pub fn format_for_display(dataset: &DataSet) -> DataSet {
    let datetime_columns: Vec<usize> = dataset
        .schema
        .fields
        .iter()
        .enumerate()
        .filter(|(_, f)| f.data_type == DataType::DateTime)
        .map(|(i, _)| i)
        .collect();
    if datetime_columns.is_empty() {
        return dataset.clone();
    }

    let mut out = dataset.map_rows(|row| {
        let mut row = row.to_vec();
        for &i in &datetime_columns {
            if let Value::DateTime(dt) = &row[i] {
                let date = dt.date();
                row[i] = Value::Date(date);
            }
        }
        row
    });
    for &i in &datetime_columns {
        out.schema.fields[i].data_type = DataType::Date;
    }
    out
}

/// Write `dataset` as comma-separated UTF-8 text: one header row, then one line per row.
///
/// Timestamps are written as plain dates, nulls as empty fields. Fields containing the
/// delimiter, quotes or line breaks are quoted.
pub fn write_csv<W: Write>(dataset: &DataSet, writer: W) -> Result<(), ExportError> {
    let display = format_for_display(dataset);
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(display.schema.field_names())?;
    for row in &display.rows {
        wtr.write_record(row.iter().map(Value::to_string))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Serialize `dataset` to CSV bytes, ready for download.
pub fn export_csv(dataset: &DataSet) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::new();
    write_csv(dataset, &mut buf)?;
    Ok(buf)
}
