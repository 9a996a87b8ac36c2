//! Per-record structural gate.

use crate::core::{ErrorDetail, FieldType, Record, Schema, Value};

/// Checks `record` against `schema` and returns the first violation.
///
/// Fields are visited in lexicographic order so the reported violation is
/// reproducible when several fields are wrong.
pub fn check(record: &Record, schema: &Schema) -> Option<ErrorDetail> {
    schema.iter().find_map(|(field, expected)| {
        let Some(value) = record.get(field) else {
            return Some(ErrorDetail::schema(field, "field missing"));
        };
        type_mismatch(value, expected).map(|reason| ErrorDetail::schema(field, reason))
    })
}

fn type_mismatch(value: &Value, expected: &FieldType) -> Option<&'static str> {
    let matches = match expected {
        FieldType::String => matches!(value, Value::String(_)),
        FieldType::Number => value.as_number().is_some(),
        FieldType::Boolean => matches!(value, Value::Bool(_)),
        FieldType::Other(_) => true,
    };
    if matches {
        return None;
    }
    Some(match expected {
        FieldType::String => "expected string",
        FieldType::Number => "expected number",
        _ => "expected boolean",
    })
}
