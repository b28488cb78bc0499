use serde_json::Value;
use std::cmp::Ordering;

use crate::table::Record;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "▲",
            SortDirection::Descending => "▼",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortState {
    pub key: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    /// Selecting the active ascending column reverses it, any other selection
    /// sorts ascending by the new column.
    pub fn toggle(&mut self, key: &str) {
        self.direction = match (&self.key, self.direction) {
            (Some(active), SortDirection::Ascending) if active == key => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        self.key = Some(key.to_string());
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.key.as_deref() == Some(key)
    }

    /// Reorders `rows` (indices into `raw`). Sorting is stable.
    pub fn apply(&self, raw: &[Record], rows: &mut [usize]) {
        let Some(key) = self.key.as_deref() else {
            return;
        };
        rows.sort_by(|&a, &b| {
            let ord = compare_values(raw[a].get(key), raw[b].get(key));
            match self.direction {
                SortDirection::Ascending => ord,
                SortDirection::Descending => ord.reverse(),
            }
        });
    }
}

/// Orders scalars of the same JSON type by value. Values of different types are
/// grouped by type (missing and null first, nested values last) so the order
/// stays total. Nested values compare equal to each other.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => Ordering::Equal,
        },
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Bool(_)) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Array(_) | Value::Object(_)) => 4,
    }
}
