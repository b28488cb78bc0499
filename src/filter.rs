use rayon::prelude::*;
use std::collections::HashMap;
use tracing::trace;

use crate::table::{Record, cell_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum FilterMode {
    /// One query matched against every field
    Global,
    /// One value and operator per column
    Columns,
}

impl FilterMode {
    pub fn toggled(self) -> Self {
        match self {
            FilterMode::Global => FilterMode::Columns,
            FilterMode::Columns => FilterMode::Global,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    Contains,
    StartWith,
    EndWith,
    DoesNotContain,
    Equals,
    DoesNotEqual,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 6] = [
        FilterOperator::Contains,
        FilterOperator::StartWith,
        FilterOperator::EndWith,
        FilterOperator::DoesNotContain,
        FilterOperator::Equals,
        FilterOperator::DoesNotEqual,
    ];

    /// Unknown tags yield `None`, which filters nothing.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "contains" => Some(FilterOperator::Contains),
            "start with" => Some(FilterOperator::StartWith),
            "end with" => Some(FilterOperator::EndWith),
            "does not contain" => Some(FilterOperator::DoesNotContain),
            "equals" => Some(FilterOperator::Equals),
            "does not equal" => Some(FilterOperator::DoesNotEqual),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            FilterOperator::Contains => "contains",
            FilterOperator::StartWith => "start with",
            FilterOperator::EndWith => "end with",
            FilterOperator::DoesNotContain => "does not contain",
            FilterOperator::Equals => "equals",
            FilterOperator::DoesNotEqual => "does not equal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FilterOperator::Contains => "Contains",
            FilterOperator::StartWith => "Start With",
            FilterOperator::EndWith => "End With",
            FilterOperator::DoesNotContain => "Does Not Contain",
            FilterOperator::Equals => "Equals",
            FilterOperator::DoesNotEqual => "Does Not Equal",
        }
    }

    pub fn next(&self) -> Self {
        let idx = Self::ALL.iter().position(|op| op == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Both sides are expected to be case folded already.
    pub fn matches(&self, value: &str, term: &str) -> bool {
        match self {
            FilterOperator::Contains => value.contains(term),
            FilterOperator::StartWith => value.starts_with(term),
            FilterOperator::EndWith => value.ends_with(term),
            FilterOperator::DoesNotContain => !value.contains(term),
            FilterOperator::Equals => value == term,
            FilterOperator::DoesNotEqual => value != term,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FilterState {
    query: String,
    values: HashMap<String, String>,
    operators: HashMap<String, String>,
}

impl FilterState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    pub fn value(&self, field: &str) -> &str {
        self.values.get(field).map(String::as_str).unwrap_or("")
    }

    pub fn set_value(&mut self, field: &str, value: impl Into<String>) {
        self.values.insert(field.to_string(), value.into());
    }

    /// Raw operator tag of a field, `contains` if none was chosen.
    pub fn operator_tag(&self, field: &str) -> &str {
        self.operators
            .get(field)
            .map(String::as_str)
            .unwrap_or(FilterOperator::Contains.tag())
    }

    pub fn operator(&self, field: &str) -> Option<FilterOperator> {
        FilterOperator::parse(self.operator_tag(field))
    }

    pub fn set_operator(&mut self, field: &str, tag: impl Into<String>) {
        self.operators.insert(field.to_string(), tag.into());
    }

    pub fn cycle_operator(&mut self, field: &str) -> FilterOperator {
        let next = self
            .operator(field)
            .map(|op| op.next())
            .unwrap_or(FilterOperator::Contains);
        self.set_operator(field, next.tag());
        next
    }

    pub fn clear(&mut self) {
        self.query.clear();
        self.values.clear();
        self.operators.clear();
    }

    pub fn is_active(&self, mode: FilterMode) -> bool {
        match mode {
            FilterMode::Global => !self.query.is_empty(),
            FilterMode::Columns => self.values.values().any(|v| !v.is_empty()),
        }
    }

    fn matches_query(record: &Record, folded_query: &str) -> bool {
        if folded_query.is_empty() {
            return true;
        }
        record
            .values()
            .any(|v| cell_text(Some(v)).to_lowercase().contains(folded_query))
    }

    fn matches_columns(&self, record: &Record) -> bool {
        self.values
            .iter()
            .filter(|(_, term)| !term.is_empty())
            .all(|(field, term)| match self.operator(field) {
                Some(op) => {
                    let value = cell_text(record.get(field)).to_lowercase();
                    op.matches(&value, &term.to_lowercase())
                }
                None => true,
            })
    }
}

/// Records of `raw` the filter keeps, in their original order.
pub fn apply(raw: &[Record], state: &FilterState, mode: FilterMode) -> Vec<usize> {
    let matches: Vec<usize> = match mode {
        FilterMode::Global => {
            let folded = state.query.to_lowercase();
            raw.par_iter()
                .enumerate()
                .filter(|(_, r)| FilterState::matches_query(r, &folded))
                .map(|(idx, _)| idx)
                .collect()
        }
        FilterMode::Columns => raw
            .iter()
            .enumerate()
            .filter(|(_, r)| state.matches_columns(r))
            .map(|(idx, _)| idx)
            .collect(),
    };
    trace!("Filter {:?} kept {}/{} records", mode, matches.len(), raw.len());
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn users() -> Vec<Record> {
        let data = json!([
            {"id": 1, "name": "Leanne Graham", "username": "Bret", "address": {"city": "Gwenborough"}},
            {"id": 2, "name": "Ervin Howell", "username": "Antonette", "address": {"city": "Wisokyburgh"}},
            {"id": 3, "name": "Clementine Bauch", "username": "Samantha", "address": null},
            {"id": 4, "name": "Patricia Lebsack", "username": "Karianne"},
            {"id": 5, "name": "Chelsey Dietrich", "username": "Kamren", "address": {"city": "Roscoeview"}},
        ]);
        match data {
            Value::Array(rows) => rows
                .into_iter()
                .filter_map(|r| match r {
                    Value::Object(m) => Some(m),
                    _ => None,
                })
                .collect(),
            _ => unreachable!(),
        }
    }

    fn columns(field: &str, value: &str, op: FilterOperator) -> FilterState {
        let mut state = FilterState::default();
        state.set_value(field, value);
        state.set_operator(field, op.tag());
        state
    }

    #[test]
    fn empty_query_matches_everything() {
        let raw = users();
        let state = FilterState::default();
        assert_eq!(apply(&raw, &state, FilterMode::Global), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn global_query_is_case_insensitive_over_all_fields() {
        let raw = users();
        let mut state = FilterState::default();
        state.set_query("KAM");
        assert_eq!(apply(&raw, &state, FilterMode::Global), vec![4]);

        // Nested objects are matched on their JSON text
        state.set_query("wisoky");
        assert_eq!(apply(&raw, &state, FilterMode::Global), vec![1]);
    }

    #[test]
    fn operators_match_folded_values() {
        let raw = users();
        let cases = [
            (FilterOperator::Contains, "ann", vec![0]),
            (FilterOperator::StartWith, "c", vec![2, 4]),
            (FilterOperator::EndWith, "ch", vec![2, 4]),
            (FilterOperator::Equals, "ervin howell", vec![1]),
        ];
        for (op, term, expected) in cases {
            let state = columns("name", term, op);
            assert_eq!(apply(&raw, &state, FilterMode::Columns), expected, "{op:?}");
        }
    }

    #[test]
    fn does_not_contain_is_complement_of_contains() {
        let raw = users();
        for term in ["a", "an", "graham", "zzz"] {
            let with = apply(&raw, &columns("name", term, FilterOperator::Contains), FilterMode::Columns);
            let without = apply(
                &raw,
                &columns("name", term, FilterOperator::DoesNotContain),
                FilterMode::Columns,
            );
            let mut all: Vec<usize> = with.iter().chain(without.iter()).copied().collect();
            all.sort_unstable();
            assert_eq!(all, vec![0, 1, 2, 3, 4], "term {term}");
            assert!(with.iter().all(|i| !without.contains(i)));
        }
    }

    #[test]
    fn equals_and_does_not_equal_partition() {
        let raw = users();
        let eq = apply(&raw, &columns("username", "bret", FilterOperator::Equals), FilterMode::Columns);
        let ne = apply(
            &raw,
            &columns("username", "bret", FilterOperator::DoesNotEqual),
            FilterMode::Columns,
        );
        assert_eq!(eq, vec![0]);
        assert_eq!(ne, vec![1, 2, 3, 4]);
    }

    #[test]
    fn missing_and_null_fields_compare_as_empty() {
        let raw = users();
        let state = columns("address", "city", FilterOperator::DoesNotContain);
        assert_eq!(apply(&raw, &state, FilterMode::Columns), vec![2, 3]);
    }

    #[test]
    fn nested_values_match_their_json_text() {
        let raw = users();
        let state = columns("address", r#""city":"wiso"#, FilterOperator::Contains);
        assert_eq!(apply(&raw, &state, FilterMode::Columns), vec![1]);
        let state = columns("address", "object", FilterOperator::Contains);
        assert!(apply(&raw, &state, FilterMode::Columns).is_empty());
    }

    #[test]
    fn column_filters_are_combined_with_and() {
        let raw = users();
        let mut state = columns("name", "e", FilterOperator::Contains);
        state.set_value("username", "k");
        state.set_operator("username", FilterOperator::StartWith.tag());
        assert_eq!(apply(&raw, &state, FilterMode::Columns), vec![3, 4]);
    }

    #[test]
    fn empty_values_and_unknown_operators_match_all() {
        let raw = users();
        let state = columns("name", "", FilterOperator::Equals);
        assert_eq!(apply(&raw, &state, FilterMode::Columns).len(), 5);

        let mut state = FilterState::default();
        state.set_value("name", "nobody");
        state.set_operator("name", "sounds like");
        assert_eq!(state.operator("name"), None);
        assert_eq!(apply(&raw, &state, FilterMode::Columns).len(), 5);
    }

    #[test]
    fn operator_defaults_and_cycles() {
        let mut state = FilterState::default();
        assert_eq!(state.operator("id"), Some(FilterOperator::Contains));
        assert_eq!(state.cycle_operator("id"), FilterOperator::StartWith);
        for _ in 0..5 {
            state.cycle_operator("id");
        }
        assert_eq!(state.operator("id"), Some(FilterOperator::Contains));

        state.set_operator("id", "bogus");
        assert_eq!(state.cycle_operator("id"), FilterOperator::Contains);
    }

    #[test]
    fn operator_tags_round_trip() {
        for op in FilterOperator::ALL {
            assert_eq!(FilterOperator::parse(op.tag()), Some(op));
        }
    }

    #[test]
    fn activity_depends_on_mode() {
        let mut state = FilterState::default();
        state.set_value("name", "x");
        assert!(state.is_active(FilterMode::Columns));
        assert!(!state.is_active(FilterMode::Global));
        state.clear();
        assert!(!state.is_active(FilterMode::Columns));
    }
}
