// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::ids::RecordId;

pub type Fields = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FieldValue {
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value),
            _ => None,
        }
    }

    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub const fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Plain rendering used by table cells, filters and CSV.
    pub fn display(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(value) => value.to_string(),
            Self::Number(value) => format_number(*value),
            Self::Text(value) => value.clone(),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(value) => Value::Bool(*value),
            Self::Number(value) => {
                if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
                    Value::from(*value as i64)
                } else {
                    serde_json::Number::from_f64(*value).map_or(Value::Null, Value::Number)
                }
            }
            Self::Text(value) => Value::String(value.clone()),
        }
    }
}

impl From<&Value> for FieldValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(flag) => Self::Bool(*flag),
            Value::Number(number) => number.as_f64().map_or(Self::Null, Self::Number),
            Value::String(text) => Self::Text(text.clone()),
            // nested values are not part of the row model; keep them readable
            Value::Array(_) | Value::Object(_) => Self::Text(value.to_string()),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// One table row: a stable identifier and its scalar fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub fields: Fields,
}

impl Record {
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            fields: Fields::new(),
        }
    }

    pub fn with(mut self, field: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(field.to_owned(), value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }

    pub fn set(&mut self, field: &str, value: impl Into<FieldValue>) {
        self.fields.insert(field.to_owned(), value.into());
    }

    /// Shallow merge: fields named in `changes` overwrite, the rest stay.
    pub fn merge(&mut self, changes: &Fields) {
        for (key, value) in changes {
            self.fields.insert(key.clone(), value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{FieldValue, Fields, Record};
    use serde_json::json;

    #[test]
    fn merge_preserves_untouched_fields() {
        let mut record = Record::new(1)
            .with("supplier", "John Doe")
            .with("status", "Active");
        let mut changes = Fields::new();
        changes.insert("status".to_owned(), FieldValue::text("Inactive"));

        record.merge(&changes);

        assert_eq!(record.text("supplier"), Some("John Doe"));
        assert_eq!(record.text("status"), Some("Inactive"));
    }

    #[test]
    fn json_scalars_map_to_field_values() {
        assert_eq!(FieldValue::from(&json!("x")), FieldValue::text("x"));
        assert_eq!(FieldValue::from(&json!(true)), FieldValue::Bool(true));
        assert_eq!(FieldValue::from(&json!(12)), FieldValue::Number(12.0));
        assert_eq!(FieldValue::from(&json!(null)), FieldValue::Null);
        assert_eq!(
            FieldValue::from(&json!(["a"])),
            FieldValue::text("[\"a\"]")
        );
    }

    #[test]
    fn display_drops_trailing_zero_for_whole_numbers() {
        assert_eq!(FieldValue::Number(250.0).display(), "250");
        assert_eq!(FieldValue::Number(2.5).display(), "2.5");
        assert_eq!(FieldValue::Null.display(), "");
    }

    #[test]
    fn whole_numbers_serialize_as_integers() {
        assert_eq!(FieldValue::Number(3.0).to_json(), json!(3));
        assert_eq!(FieldValue::Number(3.25).to_json(), json!(3.25));
    }
}
