// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

use crate::ids::RecordId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Success => "success",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level.as_str(), self.title, self.message)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    Create,
    Update,
    Delete,
}

impl SyncOp {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

/// Everything that can go wrong in a controller; none of it is fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerError {
    FetchFailure { reason: String },
    SyncFailure { op: SyncOp, id: RecordId, reason: String },
    NotFound { id: RecordId },
    UnknownTab { key: String },
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchFailure { reason } => write!(f, "failed to fetch data: {reason}"),
            Self::SyncFailure { op, id, reason } => write!(
                f,
                "{} of row {id} saved locally but failed to sync with server: {reason}",
                op.as_str()
            ),
            Self::NotFound { id } => write!(f, "no row with id {id}"),
            Self::UnknownTab { key } => write!(f, "unknown tab {key:?}"),
        }
    }
}

impl std::error::Error for ControllerError {}

impl ControllerError {
    pub fn to_notice(&self) -> Notice {
        match self {
            Self::FetchFailure { .. } => {
                Notice::new(NoticeLevel::Error, "Error fetching data", self.to_string())
            }
            Self::SyncFailure { .. } => Notice::new(NoticeLevel::Warning, "Warning", self.to_string()),
            Self::NotFound { .. } => Notice::new(NoticeLevel::Warning, "Row not found", self.to_string()),
            Self::UnknownTab { .. } => Notice::new(NoticeLevel::Warning, "Unknown tab", self.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ControllerError, NoticeLevel, SyncOp};

    #[test]
    fn sync_failure_is_a_warning_mentioning_local_copy() {
        let notice = ControllerError::SyncFailure {
            op: SyncOp::Delete,
            id: 4.into(),
            reason: "HTTP 500".to_owned(),
        }
        .to_notice();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert!(notice.message.contains("delete of row 4"));
        assert!(notice.message.contains("saved locally"));
    }

    #[test]
    fn fetch_failure_is_an_error() {
        let notice = ControllerError::FetchFailure {
            reason: "connection refused".to_owned(),
        }
        .to_notice();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(
            notice.to_string(),
            "[error] Error fetching data: failed to fetch data: connection refused"
        );
    }
}
