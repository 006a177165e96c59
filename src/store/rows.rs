//! Boundary rows: string-keyed field mappings as handed over by a row source.
//!
//! This is the only place untyped maps exist. Keys are uppercased on the way
//! in, so `org_name`, `Org_Name` and `ORG_NAME` address the same column.

use std::collections::HashMap;

use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    fields: HashMap<String, String>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly for tests and fixtures.
    pub fn with(mut self, key: &str, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<String>) {
        self.fields
            .insert(key.trim().to_ascii_uppercase(), value.into());
    }

    /// Value of a column, empty when absent.
    pub fn get(&self, key: &str) -> &str {
        self.fields
            .get(&key.to_ascii_uppercase())
            .map(String::as_str)
            .unwrap_or("")
    }

    /// Converts a JSON object; scalars are stringified, `null` becomes empty,
    /// arrays of scalars are comma-joined.
    pub fn from_json_object(object: &serde_json::Map<String, Value>) -> Self {
        let mut row = Self::new();
        for (key, value) in object {
            row.insert(key, value_to_string(value));
        }
        row
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut row = Self::new();
        for (k, v) in iter {
            row.insert(k.as_ref(), v);
        }
        row
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

/// Lenient boolean parse for flag columns.
pub fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "t" | "yes" | "y" | "1"
    )
}

/// Coordinates that fail to parse, or are not finite, count as absent.
pub fn parse_coordinate(raw: &str) -> Option<f64> {
    let value: f64 = raw.trim().parse().ok()?;
    value.is_finite().then_some(value)
}
