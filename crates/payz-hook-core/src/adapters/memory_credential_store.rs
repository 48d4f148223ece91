//! # In-Memory Credential Store
//!
//! Thread-safe in-memory implementation for tests and literal configuration.

use crate::credentials::{CredentialError, CredentialId, CredentialStore, SecretValue};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

/// In-memory credential store
///
/// Uses RwLock for concurrent access with minimal contention. Cloning the
/// store shares the underlying map, so secrets added through one handle are
/// visible through every other.
#[derive(Clone, Default)]
pub struct InMemoryCredentialStore {
    secrets: Arc<RwLock<HashMap<CredentialId, SecretValue>>>,
}

impl InMemoryCredentialStore {
    /// Create new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create store pre-populated with secrets
    pub fn with_secrets(secrets: HashMap<CredentialId, SecretValue>) -> Self {
        Self {
            secrets: Arc::new(RwLock::new(secrets)),
        }
    }

    /// Add or replace a secret
    pub fn add_secret(&self, id: CredentialId, value: SecretValue) {
        let mut secrets = self.secrets.write().unwrap_or_else(|e| e.into_inner());
        secrets.insert(id, value);
    }

    /// Remove a secret
    pub fn remove_secret(&self, id: &CredentialId) {
        let mut secrets = self.secrets.write().unwrap_or_else(|e| e.into_inner());
        secrets.remove(id);
    }
}

impl std::fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self
            .secrets
            .read()
            .map(|s| s.len())
            .unwrap_or_default();
        f.debug_struct("InMemoryCredentialStore")
            .field("secrets", &count)
            .finish()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get_secret(&self, id: &CredentialId) -> Result<SecretValue, CredentialError> {
        let value = {
            let secrets = self.secrets.read().map_err(|_| CredentialError::Unavailable {
                message: "in-memory credential store lock poisoned".to_string(),
            })?;
            secrets
                .get(id)
                .cloned()
                .ok_or_else(|| CredentialError::NotFound { id: id.clone() })?
        }; // Lock released here

        if value.is_empty() {
            return Err(CredentialError::EmptySecret { id: id.clone() });
        }

        Ok(value)
    }
}

#[cfg(test)]
#[path = "memory_credential_store_tests.rs"]
mod tests;
