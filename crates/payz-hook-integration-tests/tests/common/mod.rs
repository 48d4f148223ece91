//! Common test utilities for payz-hook integration tests
//!
//! This module provides:
//! - A recording execution sink
//! - Builders for configuration, routers and signed requests
//! - Response body helpers

use async_trait::async_trait;
use axum::{
    body::Body,
    http::Request,
    response::Response,
    Router,
};
use payz_hook_api::{
    create_router, AppState, CredentialConfig, SecretSourceConfig, ServiceConfig, ServiceMetrics,
};
use payz_hook_core::{
    webhook::SignatureAuthenticator, CredentialId, ExecutionSink, SecretValue, SinkError,
    Timestamp, WebhookDispatcher, WebhookVerifier,
};
use std::sync::{Arc, Mutex};

pub const TEST_SECRET: &str = "whsec_test";
pub const COMPLETED_BODY: &str = r#"{"event":"payment.completed","id":"abc"}"#;

// ============================================================================
// Recording Sink
// ============================================================================

/// Execution sink that keeps every forwarded batch
#[derive(Clone, Default)]
#[allow(dead_code)]
pub struct RecordingSink {
    batches: Arc<Mutex<Vec<Vec<serde_json::Value>>>>,
}

impl RecordingSink {
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)]
    pub fn batches(&self) -> Vec<Vec<serde_json::Value>> {
        self.batches.lock().unwrap().clone()
    }

    #[allow(dead_code)]
    pub fn call_count(&self) -> usize {
        self.batches.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutionSink for RecordingSink {
    async fn forward(&self, items: Vec<serde_json::Value>) -> Result<(), SinkError> {
        self.batches.lock().unwrap().push(items);
        Ok(())
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Service configuration with the test secret declared literally
#[allow(dead_code)]
pub fn config_with_secret() -> ServiceConfig {
    ServiceConfig {
        credentials: vec![CredentialConfig {
            id: CredentialId::default(),
            webhook_secret: SecretSourceConfig::Literal {
                value: TEST_SECRET.to_string(),
            },
        }],
        ..Default::default()
    }
}

/// Build a dispatcher for `config` that forwards into `sink`
#[allow(dead_code)]
pub fn dispatcher_for(config: &ServiceConfig, sink: Arc<dyn ExecutionSink>) -> WebhookDispatcher {
    let verifier = WebhookVerifier::new(
        config.verifier_config().unwrap(),
        config.credential_store(),
    );
    WebhookDispatcher::new(verifier, sink)
}

/// Build the full router for `config`
#[allow(dead_code)]
pub fn router_for(config: ServiceConfig, sink: Arc<dyn ExecutionSink>) -> Router {
    let dispatcher = dispatcher_for(&config, sink);
    let state = AppState::new(config, dispatcher, ServiceMetrics::new().unwrap());
    create_router(state)
}

/// Hex HMAC-SHA256 of `body` under the test secret
#[allow(dead_code)]
pub fn sign(body: &str) -> String {
    SignatureAuthenticator::new(&SecretValue::from_string(TEST_SECRET.to_string()))
        .unwrap()
        .sign(body.as_bytes())
}

/// Current time as sent in the timestamp header
#[allow(dead_code)]
pub fn now_header() -> String {
    Timestamp::now().to_rfc3339()
}

/// POST to the default webhook path with the given PayzCore headers
#[allow(dead_code)]
pub fn webhook_request(body: &str, signature: Option<&str>, timestamp: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/webhook")
        .header("content-type", "application/json");
    if let Some(signature) = signature {
        builder = builder.header("x-payzcore-signature", signature);
    }
    if let Some(timestamp) = timestamp {
        builder = builder.header("x-payzcore-timestamp", timestamp);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Signed request for `body`, stamped with the current time
#[allow(dead_code)]
pub fn signed_request(body: &str) -> Request<Body> {
    webhook_request(body, Some(&sign(body)), Some(&now_header()))
}

#[allow(dead_code)]
pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

/// Flip the last hex character of a signature
#[allow(dead_code)]
pub fn flip_last_hex_char(signature: &str) -> String {
    let mut chars: Vec<char> = signature.chars().collect();
    if let Some(last) = chars.last_mut() {
        *last = if *last == '0' { '1' } else { '0' };
    }
    chars.into_iter().collect()
}
