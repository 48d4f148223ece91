//! # Environment Credential Store
//!
//! Reads webhook secrets from process environment variables at fetch time.

use crate::credentials::{CredentialError, CredentialId, CredentialStore, SecretValue};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Credential store backed by environment variables
///
/// Each credential id is bound to the name of the variable holding its
/// secret. The variable is read on every [`get_secret`](CredentialStore::get_secret)
/// call; nothing is cached.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentCredentialStore {
    variables: HashMap<CredentialId, String>,
}

impl EnvironmentCredentialStore {
    /// Create a store with no bindings
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a credential id to an environment variable name
    pub fn bind(mut self, id: CredentialId, variable: impl Into<String>) -> Self {
        self.variables.insert(id, variable.into());
        self
    }

    /// Name of the variable bound to `id`, if any
    pub fn variable_for(&self, id: &CredentialId) -> Option<&str> {
        self.variables.get(id).map(String::as_str)
    }
}

#[async_trait]
impl CredentialStore for EnvironmentCredentialStore {
    async fn get_secret(&self, id: &CredentialId) -> Result<SecretValue, CredentialError> {
        let variable = self
            .variables
            .get(id)
            .ok_or_else(|| CredentialError::NotFound { id: id.clone() })?;

        match std::env::var(variable) {
            Ok(value) if !value.is_empty() => Ok(SecretValue::from_string(value)),
            Ok(_) => Err(CredentialError::EmptySecret { id: id.clone() }),
            Err(std::env::VarError::NotPresent) => {
                debug!(credential = %id, variable = %variable, "Secret variable not set");
                Err(CredentialError::EmptySecret { id: id.clone() })
            }
            Err(std::env::VarError::NotUnicode(_)) => Err(CredentialError::Unavailable {
                message: format!("environment variable '{}' is not valid UTF-8", variable),
            }),
        }
    }
}

#[cfg(test)]
#[path = "environment_credential_store_tests.rs"]
mod tests;
