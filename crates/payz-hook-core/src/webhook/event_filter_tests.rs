//! Tests for event subscriptions.

use super::*;
use serde_json::json;

fn completed_only() -> EventSubscription {
    EventSubscription::new(["payment.completed"]).unwrap()
}

#[test]
fn test_subscribed_event_forwards() {
    assert!(completed_only().should_forward(&json!({"event": "payment.completed"})));
}

#[test]
fn test_unsubscribed_event_filtered() {
    assert!(!completed_only().should_forward(&json!({"event": "payment.cancelled"})));
}

#[test]
fn test_payload_without_event_forwards() {
    let sub = completed_only();
    assert!(sub.should_forward(&json!({"id": "abc"})));
    assert!(sub.should_forward(&json!({"event": null})));
    assert!(sub.should_forward(&json!({"event": ""})));
    assert!(sub.should_forward(&json!([1, 2, 3])));
}

#[test]
fn test_false_or_zero_event_forwards() {
    let sub = completed_only();
    assert!(sub.should_forward(&json!({"event": false})));
    assert!(sub.should_forward(&json!({"event": 0})));
    assert!(sub.should_forward(&json!({"event": 0.0})));
}

#[test]
fn test_other_non_string_event_filtered() {
    let sub = completed_only();
    assert!(!sub.should_forward(&json!({"event": 1})));
    assert!(!sub.should_forward(&json!({"event": true})));
    assert!(!sub.should_forward(&json!({"event": ["payment.completed"]})));
    assert!(!sub.should_forward(&json!({"event": {}})));
}

#[test]
fn test_matching_is_exact() {
    let sub = completed_only();
    assert!(!sub.should_forward(&json!({"event": "PAYMENT.COMPLETED"})));
    assert!(!sub.should_forward(&json!({"event": "payment.completed "})));
}

#[test]
fn test_empty_subscription_rejected() {
    let events: Vec<String> = Vec::new();
    assert_eq!(EventSubscription::new(events), Err(SubscriptionError::Empty));
    assert_eq!(
        EventSubscription::new(["payment.completed", "  "]),
        Err(SubscriptionError::BlankEvent)
    );
}

#[test]
fn test_unknown_events_are_accepted() {
    let sub = EventSubscription::new(["payment.refunded"]).unwrap();
    assert!(sub.contains("payment.refunded"));
}

#[test]
fn test_default_subscription() {
    let sub = EventSubscription::default();
    assert_eq!(sub.events().collect::<Vec<_>>(), vec!["payment.completed"]);
}

#[test]
fn test_from_known_events() {
    let sub =
        EventSubscription::from_events(&[PaymentEvent::Completed, PaymentEvent::Overpaid]).unwrap();
    assert!(sub.contains("payment.overpaid"));
    assert!(!sub.contains("payment.partial"));
}

#[test]
fn test_payment_event_names() {
    for event in PaymentEvent::ALL {
        assert_eq!(event.as_str().parse::<PaymentEvent>().unwrap(), event);
        assert_eq!(
            serde_json::to_value(event).unwrap(),
            json!(event.as_str())
        );
    }
    assert!("payment.refunded".parse::<PaymentEvent>().is_err());
}
