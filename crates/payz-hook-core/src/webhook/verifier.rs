//! Verification pipeline and dispatch to the execution sink.
//!
//! Stage order is fixed: signature, then timestamp, then event filter. The
//! first failing stage decides the outcome and later stages do not run. The
//! body is only parsed once the request is authenticated, or when
//! verification is disabled.

use super::{
    event_name, EventSubscription, RawRequest, RejectionReason, ReplayGuard, SignatureAuthenticator,
    VerificationOutcome, WebhookError, DEFAULT_TOLERANCE_SECONDS,
};
use crate::{
    credentials::{CredentialError, CredentialId, CredentialStore},
    sink::ExecutionSink,
    Timestamp,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// What to do when a request carries no timestamp header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingTimestampPolicy {
    /// Accept the request without replay protection
    #[default]
    Allow,
    /// Reject with [`RejectionReason::MissingTimestamp`]
    Reject,
}

/// What to do when the raw body bytes are not available for the HMAC
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnverifiableBodyPolicy {
    /// Skip the HMAC comparison with a warning. The signature header must
    /// still be present and the replay guard still runs.
    #[default]
    AllowUnverified,
    /// Reject with [`RejectionReason::UnverifiableBody`]
    Reject,
}

/// Verifier settings fixed at construction time
#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub verify_signature: bool,
    pub tolerance: Duration,
    pub subscription: EventSubscription,
    pub missing_timestamp: MissingTimestampPolicy,
    pub unverifiable_body: UnverifiableBodyPolicy,
    /// Credential holding the webhook secret
    pub credential_id: CredentialId,
}

impl VerifierConfig {
    /// Verification on, five minute tolerance, `payment.completed` only
    pub fn new(credential_id: CredentialId) -> Self {
        Self {
            verify_signature: true,
            tolerance: Duration::from_secs(DEFAULT_TOLERANCE_SECONDS),
            subscription: EventSubscription::default(),
            missing_timestamp: MissingTimestampPolicy::default(),
            unverifiable_body: UnverifiableBodyPolicy::default(),
            credential_id,
        }
    }

    pub fn with_verify_signature(mut self, verify_signature: bool) -> Self {
        self.verify_signature = verify_signature;
        self
    }

    pub fn with_tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_subscription(mut self, subscription: EventSubscription) -> Self {
        self.subscription = subscription;
        self
    }

    pub fn with_missing_timestamp(mut self, policy: MissingTimestampPolicy) -> Self {
        self.missing_timestamp = policy;
        self
    }

    pub fn with_unverifiable_body(mut self, policy: UnverifiableBodyPolicy) -> Self {
        self.unverifiable_body = policy;
        self
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self::new(CredentialId::default())
    }
}

// ============================================================================
// WebhookVerifier
// ============================================================================

/// Runs the authentication, replay and filter stages for one request
///
/// Holds no per-request state and can be shared behind an `Arc`.
#[derive(Clone)]
pub struct WebhookVerifier {
    config: VerifierConfig,
    replay_guard: ReplayGuard,
    credentials: Arc<dyn CredentialStore>,
}

impl WebhookVerifier {
    pub fn new(config: VerifierConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        if !config.verify_signature {
            warn!("Webhook signature verification is disabled; any caller can trigger executions");
        }
        Self {
            replay_guard: ReplayGuard::new(config.tolerance),
            config,
            credentials,
        }
    }

    pub fn config(&self) -> &VerifierConfig {
        &self.config
    }

    /// Confirm the webhook secret can be fetched when verification is on
    pub async fn check_credentials(&self) -> Result<(), CredentialError> {
        if self.config.verify_signature {
            self.credentials
                .get_secret(&self.config.credential_id)
                .await?;
        }
        Ok(())
    }

    /// Verify a request against the current time
    pub async fn verify(&self, request: &RawRequest) -> Result<VerificationOutcome, WebhookError> {
        self.verify_at(request, Timestamp::now()).await
    }

    /// Verify a request against an explicit `now`
    #[instrument(skip(self, request, now), fields(correlation_id = %request.correlation_id))]
    pub async fn verify_at(
        &self,
        request: &RawRequest,
        now: Timestamp,
    ) -> Result<VerificationOutcome, WebhookError> {
        if self.config.verify_signature {
            if let Err(reason) = self.authenticate(request, now).await? {
                info!(reason = reason.as_label(), "Webhook rejected");
                return Ok(VerificationOutcome::RejectedUnauthenticated(reason));
            }
        } else {
            debug!("Signature verification disabled; skipping authentication");
        }

        let payload = request.payload()?;

        if !self.config.subscription.should_forward(&payload) {
            debug!(event = ?event_name(&payload), "Webhook event not subscribed");
            return Ok(VerificationOutcome::RejectedFiltered);
        }

        Ok(VerificationOutcome::Accepted(payload))
    }

    /// Signature and replay stages
    ///
    /// The outer error is a configuration failure; the inner one is a verdict
    /// on the request.
    async fn authenticate(
        &self,
        request: &RawRequest,
        now: Timestamp,
    ) -> Result<Result<(), RejectionReason>, WebhookError> {
        let secret = self
            .credentials
            .get_secret(&self.config.credential_id)
            .await?;

        let signature = request
            .signature_header
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if signature.is_none() {
            return Ok(Err(RejectionReason::MissingSignature));
        }

        match &request.raw_bytes {
            Some(body) => {
                let authenticator = SignatureAuthenticator::new(&secret)?;
                if let Err(reason) = authenticator.verify(body, signature) {
                    return Ok(Err(reason));
                }
            }
            None => match self.config.unverifiable_body {
                UnverifiableBodyPolicy::Reject => {
                    return Ok(Err(RejectionReason::UnverifiableBody));
                }
                UnverifiableBodyPolicy::AllowUnverified => {
                    warn!(
                        "Raw request body unavailable; skipping HMAC verification. \
                         The signature cannot be checked without the original bytes"
                    );
                }
            },
        }

        match self
            .replay_guard
            .check_at(request.timestamp_header.as_deref(), now)
        {
            Err(reason) => return Ok(Err(reason)),
            Ok(Some(_)) => {}
            Ok(None) => match self.config.missing_timestamp {
                MissingTimestampPolicy::Reject => {
                    return Ok(Err(RejectionReason::MissingTimestamp));
                }
                MissingTimestampPolicy::Allow => {
                    debug!("Webhook has no timestamp header; replay protection not applied");
                }
            },
        }

        Ok(Ok(()))
    }
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// WebhookDispatcher
// ============================================================================

/// Verifies requests and forwards accepted payloads to the execution sink
#[derive(Clone)]
pub struct WebhookDispatcher {
    verifier: Arc<WebhookVerifier>,
    sink: Arc<dyn ExecutionSink>,
}

impl WebhookDispatcher {
    pub fn new(verifier: WebhookVerifier, sink: Arc<dyn ExecutionSink>) -> Self {
        Self {
            verifier: Arc::new(verifier),
            sink,
        }
    }

    pub fn verifier(&self) -> &WebhookVerifier {
        &self.verifier
    }

    /// Verify `request` and, when accepted, start exactly one execution
    ///
    /// The sink receives the parsed payload as a single-element list.
    #[instrument(skip(self, request), fields(correlation_id = %request.correlation_id))]
    pub async fn dispatch(&self, request: RawRequest) -> Result<VerificationOutcome, WebhookError> {
        let outcome = self.verifier.verify(&request).await?;

        if let VerificationOutcome::Accepted(payload) = &outcome {
            self.sink.forward(vec![payload.clone()]).await?;
            info!(
                event = ?event_name(payload),
                "Webhook accepted and forwarded to execution sink"
            );
        }

        Ok(outcome)
    }
}

impl std::fmt::Debug for WebhookDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookDispatcher")
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "verifier_tests.rs"]
mod tests;
