// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::model::{FieldValue, Record};
use crate::schema::TabPredicate;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SearchField {
    #[default]
    All,
    Field(String),
}

impl SearchField {
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Field(trimmed.to_owned())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFilter {
    pub field: String,
    pub value: String,
}

impl ColumnFilter {
    pub fn matches(&self, record: &Record) -> bool {
        match record.get(&self.field) {
            Some(FieldValue::Text(text)) => text.eq_ignore_ascii_case(&self.value),
            Some(FieldValue::Null) | None => false,
            Some(other) => other.display().eq_ignore_ascii_case(&self.value),
        }
    }
}

/// Case-insensitive substring search; only text fields can match.
pub fn search_matches(term: &str, field: &SearchField, record: &Record) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    let contains = |value: &FieldValue| {
        value
            .as_text()
            .is_some_and(|text| text.to_lowercase().contains(&needle))
    };
    match field {
        SearchField::All => record.fields.values().any(contains),
        SearchField::Field(name) => record.get(name).is_some_and(contains),
    }
}

/// Tab predicate, then column filters, then search.
#[derive(Debug, Clone, Copy)]
pub struct FilterChain<'a> {
    pub tab: TabPredicate,
    pub columns: &'a [ColumnFilter],
    pub term: &'a str,
    pub field: &'a SearchField,
}

impl FilterChain<'_> {
    pub fn matches(&self, record: &Record) -> bool {
        self.tab.matches(record)
            && self.columns.iter().all(|filter| filter.matches(record))
            && search_matches(self.term, self.field, record)
    }

    pub fn derive(&self, all: &[Record]) -> Vec<Record> {
        all.iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}
