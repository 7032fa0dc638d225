// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, bail};
use procdesk_app::{EntitySchema, FieldValue, Fields, Record, RecordId};
use serde_json::{Map, Value, json};
use tracing::warn;

const ID_KEYS: [&str; 2] = ["id", "_id"];

/// Rows from a fetch response: either `{"data": [...]}` or a bare array.
///
/// Keys are renamed to the schema's canonical column names. A canonical key
/// present verbatim wins over an alias spelling of the same column. Keys no
/// column answers to are kept as-is. Rows without an identifier are skipped.
pub fn decode_records(schema: &EntitySchema, body: Value) -> Result<Vec<Record>> {
    let rows = match body {
        Value::Array(rows) => rows,
        Value::Object(mut envelope) => match envelope.remove("data") {
            Some(Value::Array(rows)) => rows,
            Some(Value::Null) => Vec::new(),
            Some(other) => bail!("expected `data` to be an array, got {}", kind(&other)),
            None => bail!("response has no `data` array"),
        },
        other => bail!("expected an array of rows, got {}", kind(&other)),
    };

    let mut records = Vec::with_capacity(rows.len());
    for (index, row) in rows.into_iter().enumerate() {
        let Value::Object(object) = row else {
            bail!("row {index} is {}, not an object", kind(&row));
        };
        match decode_row(schema, object) {
            Some(record) => records.push(record),
            None => warn!(view = schema.name, row = index, "skipping row without id"),
        }
    }
    Ok(records)
}

fn decode_row(schema: &EntitySchema, object: Map<String, Value>) -> Option<Record> {
    let id = ID_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(decode_id))?;

    let mut fields = Fields::new();
    let mut verbatim = Vec::new();
    for (key, value) in &object {
        if ID_KEYS.contains(&key.as_str()) {
            continue;
        }
        let canonical = schema
            .column_for_remote(key)
            .map_or(key.as_str(), |column| column.key);
        if canonical == key.as_str() {
            verbatim.push(canonical);
            fields.insert(canonical.to_owned(), FieldValue::from(value));
        } else if !verbatim.contains(&canonical) {
            fields
                .entry(canonical.to_owned())
                .or_insert_with(|| FieldValue::from(value));
        }
    }
    Some(Record { id, fields })
}

fn decode_id(value: &Value) -> Option<RecordId> {
    match value {
        Value::Number(number) => number.as_i64().map(RecordId::Number),
        Value::String(text) => RecordId::text(text),
        _ => None,
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

pub fn encode_id(id: &RecordId) -> Value {
    match id {
        RecordId::Number(number) => Value::from(*number),
        RecordId::Text(text) => Value::String(text.clone()),
    }
}

/// Record fields under the names the backend reads. Keys outside the schema
/// go out as they are.
fn encode_fields(schema: &EntitySchema, record: &Record) -> Map<String, Value> {
    record
        .fields
        .iter()
        .map(|(key, value)| {
            let wire = schema.column(key).map_or(key.as_str(), |column| column.wire_key());
            (wire.to_owned(), value.to_json())
        })
        .collect()
}

/// Body of a POST fetch.
pub fn fetch_body(user: &str) -> Value {
    json!({ "email": user })
}

/// `[<record>, {"user": ...}]`
pub fn add_body(schema: &EntitySchema, record: &Record, user: &str) -> Value {
    let mut object = encode_fields(schema, record);
    object.insert("id".to_owned(), encode_id(&record.id));
    json!([Value::Object(object), { "user": user }])
}

/// The merged record, flattened next to its id and the acting user.
pub fn update_body(schema: &EntitySchema, record: &Record, user: &str) -> Value {
    let mut object = encode_fields(schema, record);
    object.insert("id".to_owned(), encode_id(&record.id));
    object.insert("user".to_owned(), Value::String(user.to_owned()));
    Value::Object(object)
}

pub fn delete_body(schema: &EntitySchema, id: &RecordId, user: &str) -> Value {
    let mut object = Map::new();
    object.insert("id".to_owned(), encode_id(id));
    object.insert(
        schema.endpoints.delete_user_key.to_owned(),
        Value::String(user.to_owned()),
    );
    Value::Object(object)
}
