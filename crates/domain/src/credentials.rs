//! Operator credentials, injected at startup.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a credential list.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialParseError {
    #[error("credential entry {index} is not of the form login:secret")]
    MalformedEntry { index: usize },

    #[error("duplicate login {login}")]
    DuplicateLogin { login: String },
}

/// Fixed mapping of login identifiers to secrets.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialSet {
    entries: HashMap<String, String>,
}

impl CredentialSet {
    /// Creates an empty set; nobody can log in.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a login/secret pair.
    pub fn with(mut self, login: impl Into<String>, secret: impl Into<String>) -> Self {
        self.entries.insert(login.into(), secret.into());
        self
    }

    /// Parses a comma-separated `login:secret` list, e.g.
    /// `"clerk:hunter2,admin:s3cret"`. Secrets may contain `:`.
    pub fn parse(spec: &str) -> Result<Self, CredentialParseError> {
        let mut entries = HashMap::new();
        for (index, entry) in spec
            .split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .enumerate()
        {
            let (login, secret) = entry
                .split_once(':')
                .filter(|(login, secret)| !login.trim().is_empty() && !secret.is_empty())
                .ok_or(CredentialParseError::MalformedEntry { index })?;

            let login = login.trim().to_string();
            if entries.contains_key(&login) {
                return Err(CredentialParseError::DuplicateLogin { login });
            }
            entries.insert(login, secret.to_string());
        }
        Ok(Self { entries })
    }

    /// Returns true if `login` exists and `secret` matches it.
    pub fn verify(&self, login: &str, secret: &str) -> bool {
        self.entries
            .get(login)
            .is_some_and(|expected| expected == secret)
    }

    /// Returns the number of configured logins.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no login is configured.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lists logins only; secrets never reach logs.
impl std::fmt::Debug for CredentialSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut logins: Vec<_> = self.entries.keys().collect();
        logins.sort();
        f.debug_struct("CredentialSet")
            .field("logins", &logins)
            .finish()
    }
}
