//! # Credentials Module
//!
//! Secure access to webhook signing secrets.
//!
//! The webhook verifier never owns a secret for longer than a single request:
//! it asks a [`CredentialStore`] for the secret each time a delivery arrives
//! and drops the returned [`SecretValue`] (zeroizing its memory) when the
//! request completes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};
use zeroize::Zeroizing;

// ============================================================================
// Core Types
// ============================================================================

/// Identifier of a credential record holding a webhook secret
///
/// Credential ids appear in configuration files and log lines, so they are
/// restricted to lowercase ASCII letters, digits, hyphens and underscores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialId(String);

impl CredentialId {
    /// Maximum accepted length of a credential id
    pub const MAX_LENGTH: usize = 64;

    /// Id used when configuration does not name one
    pub const DEFAULT: &'static str = "payzcore";

    /// Create new credential id with validation
    ///
    /// # Validation Rules
    /// - Must be 1-64 characters
    /// - Must contain only `[a-z0-9_-]`
    pub fn new(id: impl Into<String>) -> Result<Self, CredentialError> {
        let id = id.into();

        if id.is_empty() {
            return Err(CredentialError::InvalidCredentialId {
                id,
                reason: "credential id cannot be empty".to_string(),
            });
        }

        if id.len() > Self::MAX_LENGTH {
            return Err(CredentialError::InvalidCredentialId {
                id,
                reason: format!("credential id exceeds {} characters", Self::MAX_LENGTH),
            });
        }

        if !id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            return Err(CredentialError::InvalidCredentialId {
                id,
                reason: "use lowercase alphanumeric characters, hyphens or underscores"
                    .to_string(),
            });
        }

        Ok(Self(id))
    }

    /// Get string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for CredentialId {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl fmt::Display for CredentialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CredentialId {
    type Err = CredentialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for CredentialId {
    type Error = CredentialError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CredentialId> for String {
    fn from(value: CredentialId) -> Self {
        value.0
    }
}

/// Secure container for secret values
///
/// The bytes are zeroized when the value is dropped and are never included
/// in `Debug` output or logs.
#[derive(Clone)]
pub struct SecretValue {
    inner: Zeroizing<Vec<u8>>,
}

impl SecretValue {
    /// Create secret value from string
    pub fn from_string(value: String) -> Self {
        Self::from_bytes(value.into_bytes())
    }

    /// Create secret value from bytes
    pub fn from_bytes(value: Vec<u8>) -> Self {
        Self {
            inner: Zeroizing::new(value),
        }
    }

    /// Get secret as bytes (only for immediate use)
    ///
    /// # Security Warning
    /// The returned slice contains the actual secret value.
    /// Use immediately and avoid copying it into longer-lived buffers.
    pub fn expose_bytes(&self) -> &[u8] {
        &self.inner
    }

    /// Check if secret is empty
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Get secret length without exposing content
    pub fn len(&self) -> usize {
        self.inner.len()
    }
}

impl fmt::Debug for SecretValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretValue")
            .field("length", &self.len())
            .field("value", &"[REDACTED]")
            .finish()
    }
}

// ============================================================================
// Interface Traits
// ============================================================================

/// Source of webhook signing secrets
///
/// Implementations must be safe to call concurrently; the verifier calls
/// [`get_secret`](Self::get_secret) once per inbound request.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Fetch the secret stored under `id`
    ///
    /// # Errors
    /// - `CredentialError::NotFound` - No credential with this id
    /// - `CredentialError::EmptySecret` - Credential exists but holds no secret
    /// - `CredentialError::Unavailable` - Backing store could not be reached
    async fn get_secret(&self, id: &CredentialId) -> Result<SecretValue, CredentialError>;
}

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised while retrieving webhook secrets
///
/// Every variant is an operator-facing configuration problem; none of them
/// says anything about the authenticity of an inbound request.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CredentialError {
    #[error("Invalid credential id '{id}': {reason}")]
    InvalidCredentialId { id: String, reason: String },

    #[error("Credential not found: {id}")]
    NotFound { id: CredentialId },

    #[error("Credential '{id}' has no webhook secret configured")]
    EmptySecret { id: CredentialId },

    #[error("Credential store unavailable: {message}")]
    Unavailable { message: String },
}

impl CredentialError {
    /// Check if a later attempt could succeed without operator action
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

#[cfg(test)]
#[path = "credentials_tests.rs"]
mod tests;
