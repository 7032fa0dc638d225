// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer(String),
    Cookie(String),
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::Cookie(_) => f.write_str("Cookie(<redacted>)"),
        }
    }
}

/// Who is acting, and what to present to the backend on their behalf.
///
/// Handed to a controller at construction; nothing in this workspace reads
/// credentials from anywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    user: String,
    credential: Option<Credential>,
}

impl Session {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            credential: None,
        }
    }

    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    pub fn current_user(&self) -> &str {
        &self.user
    }

    pub fn credentials(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::{Credential, Session};

    #[test]
    fn debug_output_redacts_secrets() {
        let session =
            Session::new("buyer@example.com").with_credential(Credential::Bearer("s3cret".into()));
        let rendered = format!("{session:?}");
        assert!(rendered.contains("buyer@example.com"));
        assert!(!rendered.contains("s3cret"));
    }

    #[test]
    fn accessors_expose_user_and_credential() {
        let session = Session::new("ops@example.com")
            .with_credential(Credential::Cookie("sid=abc".into()));
        assert_eq!(session.current_user(), "ops@example.com");
        assert_eq!(
            session.credentials(),
            Some(&Credential::Cookie("sid=abc".into()))
        );
        assert_eq!(Session::default().credentials(), None);
    }
}
