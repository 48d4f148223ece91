//! # Webhook Verification Module
//!
//! Authenticates PayzCore payment callbacks and decides whether they reach
//! the execution sink.
//!
//! Every inbound request passes through three stages in a fixed order:
//!
//! 1. [`SignatureAuthenticator`]: HMAC-SHA256 over the exact received bytes
//! 2. [`ReplayGuard`]: bounds the age of the signed timestamp
//! 3. [`EventSubscription`]: allow-list of event names
//!
//! The body is parsed as JSON only after stage 2, so nothing about its
//! content is revealed to an unauthenticated caller.
//!
//! [`WebhookVerifier`] runs the stages and [`WebhookDispatcher`] forwards
//! accepted payloads to an [`ExecutionSink`](crate::ExecutionSink).

use crate::{
    credentials::CredentialError, sink::SinkError, CorrelationId, ErrorCategory, Timestamp,
};
use bytes::Bytes;

mod event_filter;
mod replay;
mod signature;
mod verifier;

pub use event_filter::{EventSubscription, PaymentEvent, SubscriptionError};
pub use replay::{ReplayGuard, DEFAULT_TOLERANCE_SECONDS};
pub use signature::{SignatureAuthenticator, SIGNATURE_LENGTH};
pub use verifier::{
    MissingTimestampPolicy, UnverifiableBodyPolicy, VerifierConfig, WebhookDispatcher,
    WebhookVerifier,
};

/// Header carrying the hex-encoded HMAC-SHA256 of the request body
pub const SIGNATURE_HEADER: &str = "x-payzcore-signature";

/// Header carrying the ISO-8601 time at which the provider signed the request
pub const TIMESTAMP_HEADER: &str = "x-payzcore-timestamp";

// ============================================================================
// Core Types
// ============================================================================

/// Inbound webhook request as seen by the verifier
///
/// Requests from the wire carry only `raw_bytes`; the JSON is parsed by
/// [`RawRequest::payload`] once authentication has passed. Requests from a
/// transport that only delivered a parsed body carry `parsed_body` and no
/// bytes. In that case the HMAC cannot be computed and the verifier falls
/// back to its [`UnverifiableBodyPolicy`].
#[derive(Debug, Clone)]
pub struct RawRequest {
    pub raw_bytes: Option<Bytes>,
    pub signature_header: Option<String>,
    pub timestamp_header: Option<String>,
    pub parsed_body: Option<serde_json::Value>,
    pub correlation_id: CorrelationId,
    pub received_at: Timestamp,
}

impl RawRequest {
    /// Build a request from the bytes received on the wire
    ///
    /// The bytes are kept verbatim for the signature check and are not
    /// inspected here.
    pub fn from_wire(
        body: Bytes,
        signature_header: Option<String>,
        timestamp_header: Option<String>,
    ) -> Self {
        Self {
            raw_bytes: Some(body),
            signature_header,
            timestamp_header,
            parsed_body: None,
            correlation_id: CorrelationId::new(),
            received_at: Timestamp::now(),
        }
    }

    /// Build a request from an already-parsed body with no raw bytes
    pub fn from_parsed(
        parsed_body: serde_json::Value,
        signature_header: Option<String>,
        timestamp_header: Option<String>,
    ) -> Self {
        Self {
            raw_bytes: None,
            signature_header,
            timestamp_header,
            parsed_body: Some(parsed_body),
            correlation_id: CorrelationId::new(),
            received_at: Timestamp::now(),
        }
    }

    /// Replace the generated correlation id
    pub fn with_correlation_id(mut self, correlation_id: CorrelationId) -> Self {
        self.correlation_id = correlation_id;
        self
    }

    /// The JSON payload, parsing the raw bytes when no parsed body is held
    pub fn payload(&self) -> Result<serde_json::Value, WebhookError> {
        if let Some(parsed) = &self.parsed_body {
            return Ok(parsed.clone());
        }

        let bytes = self
            .raw_bytes
            .as_ref()
            .ok_or_else(|| WebhookError::MalformedPayload {
                message: "request carries no body".to_string(),
            })?;

        serde_json::from_slice(bytes).map_err(|e| WebhookError::MalformedPayload {
            message: e.to_string(),
        })
    }
}

/// The payload's `event` field when it is a string
pub(crate) fn event_name(payload: &serde_json::Value) -> Option<&str> {
    payload.get("event").and_then(|e| e.as_str())
}

/// Why a request failed authentication or replay protection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    MissingSignature,
    InvalidSignatureFormat,
    InvalidSignature,
    InvalidTimestamp,
    StaleOrFutureTimestamp,
    MissingTimestamp,
    UnverifiableBody,
}

impl RejectionReason {
    /// Plain-text reason returned to the caller
    ///
    /// Format and mismatch failures share one message so the caller cannot
    /// tell which check failed.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::MissingSignature => "Missing signature",
            Self::InvalidSignatureFormat | Self::InvalidSignature => "Invalid signature",
            Self::InvalidTimestamp => "Invalid timestamp",
            Self::StaleOrFutureTimestamp => "Timestamp too old",
            Self::MissingTimestamp => "Missing timestamp",
            Self::UnverifiableBody => "Unverifiable body",
        }
    }

    /// Stable label for logs and metrics
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::MissingSignature => "missing_signature",
            Self::InvalidSignatureFormat => "invalid_signature_format",
            Self::InvalidSignature => "invalid_signature",
            Self::InvalidTimestamp => "invalid_timestamp",
            Self::StaleOrFutureTimestamp => "stale_or_future_timestamp",
            Self::MissingTimestamp => "missing_timestamp",
            Self::UnverifiableBody => "unverifiable_body",
        }
    }

    /// HTTP status for the rejection
    pub fn status_code(&self) -> u16 {
        401
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason())
    }
}

/// Terminal result of verifying one request
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationOutcome {
    /// Authenticated and subscribed; carries the parsed payload
    Accepted(serde_json::Value),
    RejectedUnauthenticated(RejectionReason),
    /// Authenticated but the event is not subscribed
    RejectedFiltered,
}

impl VerificationOutcome {
    /// HTTP status for the outcome
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Accepted(_) | Self::RejectedFiltered => 200,
            Self::RejectedUnauthenticated(reason) => reason.status_code(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// Label used for the request outcome metric
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Accepted(_) => "accepted",
            Self::RejectedUnauthenticated(_) => "rejected",
            Self::RejectedFiltered => "filtered",
        }
    }
}

// ============================================================================
// Error Types
// ============================================================================

/// Failures that are not a verdict on the request itself
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    /// The webhook secret could not be obtained while verification is on
    #[error("Webhook verification is misconfigured: {0}")]
    Configuration(#[from] CredentialError),

    #[error("Malformed payload: {message}")]
    MalformedPayload { message: String },

    #[error("Failed to forward accepted payload: {0}")]
    Sink(#[from] SinkError),
}

impl WebhookError {
    /// Check if error is transient and a redelivery could succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Configuration(e) => e.is_transient(),
            Self::MalformedPayload { .. } => false,
            Self::Sink(e) => e.is_transient(),
        }
    }

    /// Get error category for monitoring
    pub fn error_category(&self) -> ErrorCategory {
        match self {
            Self::Configuration(e) if e.is_transient() => ErrorCategory::Transient,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::MalformedPayload { .. } => ErrorCategory::Permanent,
            Self::Sink(e) if e.is_transient() => ErrorCategory::Transient,
            Self::Sink(_) => ErrorCategory::Permanent,
        }
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
