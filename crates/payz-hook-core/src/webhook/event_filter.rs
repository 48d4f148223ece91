//! Event subscription and filtering.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Event names PayzCore is known to emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentEvent {
    #[serde(rename = "payment.completed")]
    Completed,
    #[serde(rename = "payment.overpaid")]
    Overpaid,
    #[serde(rename = "payment.partial")]
    Partial,
    #[serde(rename = "payment.expired")]
    Expired,
    #[serde(rename = "payment.cancelled")]
    Cancelled,
}

impl PaymentEvent {
    pub const ALL: [PaymentEvent; 5] = [
        Self::Completed,
        Self::Overpaid,
        Self::Partial,
        Self::Expired,
        Self::Cancelled,
    ];

    /// Wire name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "payment.completed",
            Self::Overpaid => "payment.overpaid",
            Self::Partial => "payment.partial",
            Self::Expired => "payment.expired",
            Self::Cancelled => "payment.cancelled",
        }
    }
}

impl fmt::Display for PaymentEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentEvent {
    type Err = SubscriptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|event| event.as_str() == s)
            .ok_or_else(|| SubscriptionError::UnknownEvent {
                event: s.to_string(),
            })
    }
}

/// Errors building an [`EventSubscription`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Event subscription must name at least one event")]
    Empty,

    #[error("Event name must not be blank")]
    BlankEvent,

    #[error("Unknown payment event: {event}")]
    UnknownEvent { event: String },
}

/// Operator-configured allow-list of event names
///
/// Immutable once built. Names outside [`PaymentEvent`] are allowed so new
/// provider events can be subscribed before this crate learns about them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventSubscription {
    events: BTreeSet<String>,
}

impl EventSubscription {
    /// Build a subscription from event names
    pub fn new<I, S>(events: I) -> Result<Self, SubscriptionError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = BTreeSet::new();
        for event in events {
            let event: String = event.into();
            let event = event.trim().to_string();
            if event.is_empty() {
                return Err(SubscriptionError::BlankEvent);
            }
            if PaymentEvent::from_str(&event).is_err() {
                warn!(event = %event, "Subscribed to an event PayzCore is not known to send");
            }
            set.insert(event);
        }

        if set.is_empty() {
            return Err(SubscriptionError::Empty);
        }

        Ok(Self { events: set })
    }

    /// Subscription to the given known events
    pub fn from_events(events: &[PaymentEvent]) -> Result<Self, SubscriptionError> {
        Self::new(events.iter().map(PaymentEvent::as_str))
    }

    pub fn contains(&self, event: &str) -> bool {
        self.events.contains(event)
    }

    pub fn events(&self) -> impl Iterator<Item = &str> {
        self.events.iter().map(String::as_str)
    }

    /// Decide whether a payload should be forwarded
    ///
    /// Payloads without a usable `event` are forwarded: absent, `null`,
    /// `false`, zero or the empty string. A string event must be subscribed.
    /// Any other value never matches.
    pub fn should_forward(&self, payload: &serde_json::Value) -> bool {
        use serde_json::Value;

        match payload.get("event") {
            None | Some(Value::Null) | Some(Value::Bool(false)) => true,
            Some(Value::Number(n)) => n.as_f64() == Some(0.0),
            Some(Value::String(event)) if event.is_empty() => true,
            Some(Value::String(event)) => self.contains(event),
            Some(_) => false,
        }
    }
}

impl Default for EventSubscription {
    fn default() -> Self {
        Self {
            events: BTreeSet::from([PaymentEvent::Completed.as_str().to_string()]),
        }
    }
}

#[cfg(test)]
#[path = "event_filter_tests.rs"]
mod tests;
