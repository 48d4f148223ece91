//! Integration tests for the dispatcher without the HTTP layer
//!
//! These cover requests that never carry raw bytes, which the HTTP
//! handler cannot produce.

mod common;

use common::{config_with_secret, dispatcher_for, sign, RecordingSink, COMPLETED_BODY};
use payz_hook_core::{
    RawRequest, RejectionReason, Timestamp, UnverifiableBodyPolicy, VerificationOutcome,
};
use serde_json::json;
use std::sync::Arc;

fn parsed_request(signature: Option<String>) -> RawRequest {
    RawRequest::from_parsed(
        serde_json::from_str(COMPLETED_BODY).unwrap(),
        signature,
        Some(Timestamp::now().to_rfc3339()),
    )
}

#[tokio::test]
async fn test_unverifiable_body_is_forwarded_by_default() {
    let sink = RecordingSink::new();
    let dispatcher = dispatcher_for(&config_with_secret(), Arc::new(sink.clone()));

    let outcome = dispatcher
        .dispatch(parsed_request(Some(sign(COMPLETED_BODY))))
        .await
        .unwrap();

    assert!(outcome.is_accepted());
    assert_eq!(
        sink.batches(),
        vec![vec![json!({"event": "payment.completed", "id": "abc"})]]
    );
}

#[tokio::test]
async fn test_unverifiable_body_rejected_when_hardened() {
    let mut config = config_with_secret();
    config.webhook.unverifiable_body = UnverifiableBodyPolicy::Reject;

    let sink = RecordingSink::new();
    let dispatcher = dispatcher_for(&config, Arc::new(sink.clone()));

    let outcome = dispatcher
        .dispatch(parsed_request(Some(sign(COMPLETED_BODY))))
        .await
        .unwrap();

    assert_eq!(
        outcome,
        VerificationOutcome::RejectedUnauthenticated(RejectionReason::UnverifiableBody)
    );
    assert_eq!(sink.call_count(), 0);
}

#[tokio::test]
async fn test_unverifiable_body_still_requires_signature_header() {
    let sink = RecordingSink::new();
    let dispatcher = dispatcher_for(&config_with_secret(), Arc::new(sink.clone()));

    let outcome = dispatcher.dispatch(parsed_request(None)).await.unwrap();

    assert_eq!(
        outcome,
        VerificationOutcome::RejectedUnauthenticated(RejectionReason::MissingSignature)
    );
    assert_eq!(sink.call_count(), 0);
}
