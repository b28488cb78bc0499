use serde_json::{Map, Value};

/// One fetched JSON object. Field order follows the response body.
pub type Record = Map<String, Value>;

/// Column names of a dataset, read from its first record only.
///
/// Records are not required to share a shape. Fields that only appear in later
/// records are never shown, and records missing a discovered field render an
/// empty cell for it.
pub fn discover_columns(records: &[Record]) -> Vec<String> {
    records
        .first()
        .map(|r| r.keys().cloned().collect())
        .unwrap_or_default()
}

/// Display text of a single value: nothing for null, JSON for objects and arrays,
/// the plain string form otherwise. Filters match against this same text.
pub fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(v @ (Value::Object(_) | Value::Array(_))) => v.to_string(),
    }
}

/// Cells of `record` in column order.
pub fn row_cells(record: &Record, columns: &[String]) -> Vec<String> {
    columns.iter().map(|c| cell_text(record.get(c))).collect()
}
