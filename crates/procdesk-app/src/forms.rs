// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeMap;
use std::fmt;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::model::{FieldValue, Fields, Record};
use crate::schema::{Column, ColumnKind, EntitySchema};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    UnknownField(String),
    Required(&'static str),
    InvalidNumber(&'static str),
    InvalidDate(&'static str),
    InvalidBool(&'static str),
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField(field) => write!(f, "unknown field {field:?}"),
            Self::Required(field) => write!(f, "{field} is required"),
            Self::InvalidNumber(field) => write!(f, "{field} must be a number"),
            Self::InvalidDate(field) => {
                write!(f, "{field} must be a date (YYYY-MM-DD or RFC 3339)")
            }
            Self::InvalidBool(field) => write!(f, "{field} must be true or false"),
        }
    }
}

impl std::error::Error for FormError {}

/// Raw text for every column of a schema, as typed into an add/edit form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDraft {
    schema: &'static EntitySchema,
    values: BTreeMap<&'static str, String>,
}

impl RecordDraft {
    pub fn blank(schema: &'static EntitySchema) -> Self {
        Self {
            schema,
            values: schema
                .columns
                .iter()
                .map(|column| (column.key, String::new()))
                .collect(),
        }
    }

    pub fn from_record(schema: &'static EntitySchema, record: &Record) -> Self {
        let mut draft = Self::blank(schema);
        for column in schema.columns {
            if let Some(value) = record.get(column.key) {
                draft.values.insert(column.key, value.display());
            }
        }
        draft
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn set(&mut self, field: &str, raw: impl Into<String>) -> Result<(), FormError> {
        let column = self
            .schema
            .column(field)
            .ok_or_else(|| FormError::UnknownField(field.to_owned()))?;
        self.values.insert(column.key, raw.into());
        Ok(())
    }

    pub fn validate(&self) -> Result<(), FormError> {
        for column in self.schema.columns {
            let raw = self.raw(column);
            if raw.is_empty() {
                if column.required {
                    return Err(FormError::Required(column.key));
                }
                continue;
            }
            parse_value(column, raw)?;
        }
        Ok(())
    }

    /// Every column is submitted; empty optional columns go out as empty
    /// text so the backend sees the full shape.
    pub fn into_fields(self) -> Result<Fields, FormError> {
        self.validate()?;
        let mut fields = Fields::new();
        for column in self.schema.columns {
            let raw = self.raw(column);
            let value = if raw.is_empty() {
                match column.kind {
                    ColumnKind::Bool => FieldValue::Bool(false),
                    _ => FieldValue::text(""),
                }
            } else {
                parse_value(column, raw)?
            };
            fields.insert(column.key.to_owned(), value);
        }
        Ok(fields)
    }

    fn raw(&self, column: &Column) -> &str {
        self.values.get(column.key).map_or("", |value| value.trim())
    }
}

fn parse_value(column: &Column, raw: &str) -> Result<FieldValue, FormError> {
    match column.kind {
        ColumnKind::Text => Ok(FieldValue::text(raw)),
        ColumnKind::Number => raw
            .replace(',', "")
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(FieldValue::Number)
            .ok_or(FormError::InvalidNumber(column.key)),
        ColumnKind::Bool => parse_bool(raw)
            .map(FieldValue::Bool)
            .ok_or(FormError::InvalidBool(column.key)),
        ColumnKind::Date | ColumnKind::DateTime => {
            if is_iso_date(raw) {
                Ok(FieldValue::text(raw))
            } else {
                Err(FormError::InvalidDate(column.key))
            }
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn is_iso_date(raw: &str) -> bool {
    Date::parse(raw, &format_description!("[year]-[month]-[day]")).is_ok()
        || OffsetDateTime::parse(raw, &Rfc3339).is_ok()
        || time::PrimitiveDateTime::parse(
            raw,
            &format_description!("[year]-[month]-[day]T[hour]:[minute]"),
        )
        .is_ok()
}
