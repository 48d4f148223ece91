//! Integration tests for serving from a YAML configuration document

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::{body_text, now_header, sign, RecordingSink, COMPLETED_BODY};
use payz_hook_api::{ConfigError, ServiceConfig};
use std::sync::Arc;
use tower::ServiceExt;

const DEPLOYMENT_YAML: &str = r#"
server:
  port: 9000
webhook:
  endpoint_path: /hooks/payz
  tolerance_seconds: 60
  events:
    - payment.completed
    - payment.overpaid
  missing_timestamp: reject
credentials:
  - id: payzcore
    webhook_secret:
      type: literal
      value: whsec_test
sink:
  type: log
"#;

fn load(yaml: &str) -> ServiceConfig {
    serde_yaml::from_str(yaml).unwrap()
}

#[tokio::test]
async fn test_router_serves_configured_path() {
    let config = load(DEPLOYMENT_YAML);
    config.validate().unwrap();

    let sink = RecordingSink::new();
    let app = common::router_for(config, Arc::new(sink.clone()));

    let body = r#"{"event":"payment.overpaid","id":"o1"}"#;
    let request = Request::builder()
        .method("POST")
        .uri("/hooks/payz")
        .header("x-payzcore-signature", sign(body))
        .header("x-payzcore-timestamp", now_header())
        .body(Body::from(body))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(sink.call_count(), 1);
}

#[tokio::test]
async fn test_configured_policy_is_applied() {
    let config = load(DEPLOYMENT_YAML);
    let app = common::router_for(config, Arc::new(RecordingSink::new()));

    let request = Request::builder()
        .method("POST")
        .uri("/hooks/payz")
        .header("x-payzcore-signature", sign(COMPLETED_BODY))
        .body(Body::from(COMPLETED_BODY))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_text(response).await, "Missing timestamp");
}

#[test]
fn test_empty_event_list_is_invalid() {
    let yaml = DEPLOYMENT_YAML.replace(
        "  events:\n    - payment.completed\n    - payment.overpaid\n",
        "  events: []\n",
    );
    let config = load(&yaml);

    assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
}

#[test]
fn test_verification_without_credentials_is_missing() {
    let config = load("webhook:\n  verify_signature: true\n");

    assert!(matches!(config.validate(), Err(ConfigError::Missing { .. })));
}
