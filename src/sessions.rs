//! Column layout of the medical-session dataset.

use crate::types::{DataSet, DataType, Field};

/// Opaque session identifier.
pub const SESSION_ID: &str = "session_id";
/// Session timestamp.
pub const DATE: &str = "date";
/// Hospital service.
pub const SERVICE: &str = "service";
/// Patient language.
pub const LANGUE: &str = "langue";
/// Session duration in minutes.
pub const DUREE_MINUTES: &str = "duree_minutes";
/// Number of patient interactions.
pub const INTERACTIONS_PATIENT: &str = "interactions_patient";
/// Number of practitioner interactions.
pub const INTERACTIONS_PRATICIEN: &str = "interactions_praticien";
/// Practitioner rating, nominally in `[0, 5]`.
pub const NOTE_PRATICIEN: &str = "note_praticien";
/// Quality score, nominally in `[0, 1]`.
pub const QUALITE_SCORE: &str = "qualite_score";
/// Number of unrecognized speech segments.
pub const SEGMENTS_NON_RECONNUS: &str = "segments_non_reconnus";
/// Device used for the session.
pub const DEVICE: &str = "device";

/// Substring identifying note columns (numeric ratings or free-text commentary).
pub const NOTE_MARKER: &str = "note";

/// The nine columns every loaded dataset carries, with the type used when a column has to be
/// synthesized.
pub const EXPECTED_COLUMNS: [(&str, DataType); 9] = [
    (SERVICE, DataType::Utf8),
    (LANGUE, DataType::Utf8),
    (DUREE_MINUTES, DataType::Float64),
    (INTERACTIONS_PATIENT, DataType::Int64),
    (INTERACTIONS_PRATICIEN, DataType::Int64),
    (NOTE_PRATICIEN, DataType::Float64),
    (QUALITE_SCORE, DataType::Float64),
    (SEGMENTS_NON_RECONNUS, DataType::Int64),
    (DEVICE, DataType::Utf8),
];

/// Append every missing expected column, filled with nulls.
///
/// Returns the names of the columns that were added. Existing columns, including extra ones not
/// listed in [`EXPECTED_COLUMNS`], are left untouched.
pub fn ensure_expected_columns(dataset: &mut DataSet) -> Vec<String> {
    let mut added = Vec::new();
    for (name, data_type) in EXPECTED_COLUMNS {
        if dataset.schema.index_of(name).is_none() {
            dataset.push_null_column(Field::new(name, data_type));
            added.push(name.to_string());
        }
    }
    added
}
