//! # Payz-Hook Core
//!
//! Core business logic for the Payz-Hook webhook relay.
//!
//! This crate authenticates PayzCore payment callbacks, guards against
//! replayed deliveries, filters events against an operator subscription and
//! hands accepted payloads to a workflow execution sink.
//!
//! ## Architecture
//!
//! The core follows clean architecture principles:
//! - Business logic depends only on trait abstractions
//!   ([`CredentialStore`], [`ExecutionSink`])
//! - Infrastructure implementations are injected at construction time
//! - Every request is verified independently; no state is shared between
//!   requests other than read-only configuration
//!
//! ## Usage
//!
//! ```rust
//! use payz_hook_core::{CorrelationId, Timestamp};
//!
//! let correlation_id = CorrelationId::new();
//! let received_at = Timestamp::now();
//! assert!(!correlation_id.as_str().is_empty());
//! assert!(received_at.to_rfc3339().contains('T'));
//! ```

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// Re-export commonly used types
pub use uuid::Uuid;

// ============================================================================
// Time and Metadata Types
// ============================================================================

/// UTC timestamp with microsecond precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Create timestamp for current moment
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Parse timestamp from RFC3339 string
    pub fn from_rfc3339(s: &str) -> Result<Self, ParseError> {
        let dt = DateTime::parse_from_rfc3339(s)
            .map_err(|_| ParseError::InvalidFormat {
                expected: "RFC3339 datetime".to_string(),
                actual: s.to_string(),
            })?
            .with_timezone(&Utc);
        Ok(Self(dt))
    }

    /// Parse an ISO-8601 timestamp as sent by the payment provider.
    ///
    /// Accepts, in order of preference:
    /// - RFC 3339 with an offset (`2026-03-01T12:00:00Z`, `...+02:00`)
    /// - a date-time without offset, interpreted as UTC
    /// - a bare calendar date, interpreted as UTC midnight
    pub fn from_iso8601(s: &str) -> Result<Self, ParseError> {
        let trimmed = s.trim();

        if let Ok(ts) = Self::from_rfc3339(trimmed) {
            return Ok(ts);
        }

        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
            if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Ok(Self(naive.and_utc()));
            }
        }

        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
                return Ok(Self(midnight.and_utc()));
            }
        }

        Err(ParseError::InvalidFormat {
            expected: "ISO-8601 datetime".to_string(),
            actual: s.to_string(),
        })
    }

    /// Convert to RFC3339 string
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Add seconds to timestamp
    pub fn add_seconds(&self, seconds: i64) -> Self {
        Self(self.0 + chrono::Duration::seconds(seconds))
    }

    /// Signed distance from `other` to `self` (positive when `self` is later)
    pub fn signed_duration_since(&self, other: Self) -> chrono::Duration {
        self.0.signed_duration_since(other.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

/// Identifier for tracing requests across system boundaries
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate new correlation ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get string representation
    pub fn as_str(&self) -> String {
        self.0.to_string()
    }
}

impl Default for CorrelationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CorrelationId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = s.parse::<Uuid>().map_err(|_| ParseError::InvalidFormat {
            expected: "UUID format".to_string(),
            actual: s.to_string(),
        })?;
        Ok(Self(uuid))
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// High-level error categorization for alerting decisions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Temporary failures that a redelivery may fix
    Transient,
    /// Permanent failures that won't succeed on redelivery
    Permanent,
    /// Configuration errors that need operator action
    Configuration,
}

/// Error type for string parsing failures
#[derive(Debug, Clone, thiserror::Error)]
pub enum ParseError {
    #[error("Invalid format: expected {expected}, got '{actual}'")]
    InvalidFormat { expected: String, actual: String },
}

// ============================================================================
// Module declarations
// ============================================================================

/// Webhook verification and dispatch pipeline
pub mod webhook;

/// Credential store abstraction for webhook secrets
pub mod credentials;

/// Execution sinks that receive accepted payloads
pub mod sink;

/// Infrastructure adapters for credential storage
pub mod adapters;

// Re-export key types for convenience
pub use adapters::{EnvironmentCredentialStore, InMemoryCredentialStore};
pub use credentials::{CredentialError, CredentialId, CredentialStore, SecretValue};
pub use sink::{ChannelExecutionSink, ExecutionSink, LoggingExecutionSink, SinkError};
pub use webhook::{
    EventSubscription, MissingTimestampPolicy, PaymentEvent, RawRequest, RejectionReason,
    UnverifiableBodyPolicy, VerificationOutcome, VerifierConfig, WebhookDispatcher, WebhookError,
    WebhookVerifier,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
