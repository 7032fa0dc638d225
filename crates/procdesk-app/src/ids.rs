// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Row identifier as handed out by the backend: numeric `id` or string `_id`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    /// Reads an id typed by a person. Only canonical integers become numbers,
    /// so `0042` and `+7` stay text.
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        match trimmed.parse::<i64>() {
            Ok(number) if number.to_string() == trimmed => Some(Self::Number(number)),
            _ => Some(Self::Text(trimmed.to_owned())),
        }
    }

    /// An id that arrived as a string. Digits are not reinterpreted.
    pub fn text(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| Self::Text(trimmed.to_owned()))
    }

    pub const fn as_number(&self) -> Option<i64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for RecordId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Hands out identifiers for rows created before the backend has seen them.
///
/// Numbers continue above the largest numeric id observed so far, so a local
/// id never collides with a loaded one. Once `i64::MAX` is spent, ids fall
/// back to `local-<n>` text tokens.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: i64,
    exhausted: bool,
    tokens: u64,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self {
            next: 1,
            ..Self::default()
        }
    }

    pub fn observe(&mut self, id: &RecordId) {
        if let Some(number) = id.as_number()
            && number >= self.next
        {
            self.next = number.saturating_add(1);
        }
    }

    pub fn allocate(&mut self, taken: &HashSet<RecordId>) -> RecordId {
        while !self.exhausted {
            let number = self.next.max(1);
            match number.checked_add(1) {
                Some(next) => self.next = next,
                None => self.exhausted = true,
            }
            let candidate = RecordId::Number(number);
            if !taken.contains(&candidate) {
                return candidate;
            }
        }
        loop {
            self.tokens += 1;
            let candidate = RecordId::Text(format!("local-{}", self.tokens));
            if !taken.contains(&candidate) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{IdAllocator, RecordId};
    use std::collections::HashSet;

    #[test]
    fn parse_prefers_numbers() {
        assert_eq!(RecordId::parse("42"), Some(RecordId::Number(42)));
        assert_eq!(
            RecordId::parse(" 64f1c0 "),
            Some(RecordId::Text("64f1c0".to_owned()))
        );
        assert_eq!(RecordId::parse("  "), None);
    }

    #[test]
    fn leading_zeros_keep_an_id_textual() {
        assert_eq!(RecordId::parse("0042"), Some(RecordId::from("0042")));
        assert_eq!(RecordId::parse("+7"), Some(RecordId::from("+7")));
        assert_eq!(RecordId::text("42"), Some(RecordId::from("42")));
        assert_eq!(RecordId::text(" "), None);
    }

    #[test]
    fn allocator_falls_back_to_tokens_past_the_last_number() {
        let mut ids = IdAllocator::new();
        ids.observe(&RecordId::Number(i64::MAX));
        let mut taken: HashSet<RecordId> = [RecordId::Number(i64::MAX)].into();

        let first = ids.allocate(&taken);
        assert_eq!(first, RecordId::from("local-1"));
        taken.insert(first);
        taken.insert(RecordId::from("local-2"));
        assert_eq!(ids.allocate(&taken), RecordId::from("local-3"));
    }

    #[test]
    fn last_number_is_handed_out_once() {
        let mut ids = IdAllocator::new();
        ids.observe(&RecordId::Number(i64::MAX - 1));
        let taken = HashSet::new();
        assert_eq!(ids.allocate(&taken), RecordId::Number(i64::MAX));
        assert_eq!(ids.allocate(&taken), RecordId::from("local-1"));
    }

    #[test]
    fn allocator_continues_above_observed_ids() {
        let mut ids = IdAllocator::new();
        ids.observe(&RecordId::Number(7));
        ids.observe(&RecordId::Text("abc".to_owned()));
        ids.observe(&RecordId::Number(3));

        let taken = HashSet::new();
        assert_eq!(ids.allocate(&taken), RecordId::Number(8));
        assert_eq!(ids.allocate(&taken), RecordId::Number(9));
    }

    #[test]
    fn allocator_skips_taken_ids() {
        let mut ids = IdAllocator::new();
        let taken: HashSet<RecordId> = [RecordId::Number(1), RecordId::Number(2)].into();
        assert_eq!(ids.allocate(&taken), RecordId::Number(3));
    }

    #[test]
    fn display_matches_wire_form() {
        assert_eq!(RecordId::Number(5).to_string(), "5");
        assert_eq!(RecordId::from("a1").to_string(), "a1");
    }
}
