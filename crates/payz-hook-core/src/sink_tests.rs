//! Tests for the built-in execution sinks.

use super::*;
use serde_json::json;

#[tokio::test]
async fn test_logging_sink_accepts_everything() {
    let sink = LoggingExecutionSink;
    let result = sink
        .forward(vec![json!({"event": "payment.completed", "id": "abc"})])
        .await;
    assert!(result.is_ok());

    // Payloads without an event name are logged too.
    assert!(sink.forward(vec![json!({"id": "legacy"})]).await.is_ok());
}

#[tokio::test]
async fn test_channel_sink_delivers_items() {
    let (sink, mut receiver) = ChannelExecutionSink::new(4);
    let payload = json!({"event": "payment.completed", "id": "abc"});

    sink.forward(vec![payload.clone()]).await.unwrap();

    let received = receiver.recv().await.unwrap();
    assert_eq!(received, vec![payload]);
}

#[tokio::test]
async fn test_channel_sink_fails_when_receiver_dropped() {
    let (sink, receiver) = ChannelExecutionSink::new(1);
    drop(receiver);

    let err = sink.forward(vec![json!({})]).await.unwrap_err();
    assert!(matches!(err, SinkError::Unavailable { .. }));
    assert!(err.is_transient());
}

#[test]
fn test_rejected_is_permanent() {
    let err = SinkError::Rejected {
        message: "bad request".to_string(),
    };
    assert!(!err.is_transient());
}
