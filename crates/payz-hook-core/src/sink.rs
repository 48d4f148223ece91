//! # Execution Sinks
//!
//! Destinations for webhook payloads that passed verification.
//!
//! A sink receives the accepted payload wrapped in a single-element item list,
//! the shape a workflow engine expects for one trigger execution.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::info;

/// Receiver of accepted webhook payloads
///
/// [`forward`](Self::forward) is invoked exactly once for every accepted
/// request and never for rejected or filtered ones.
#[async_trait]
pub trait ExecutionSink: Send + Sync {
    /// Start a workflow execution for `items`
    async fn forward(&self, items: Vec<serde_json::Value>) -> Result<(), SinkError>;
}

/// Errors raised while handing a payload to the execution sink
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("Execution sink rejected payload: {message}")]
    Rejected { message: String },

    #[error("Execution sink unavailable: {message}")]
    Unavailable { message: String },
}

impl SinkError {
    /// Check if a redelivery could succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }
}

// ============================================================================
// LoggingExecutionSink
// ============================================================================

/// Sink that records accepted events in the log and nothing else
///
/// Used when no downstream workflow engine is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingExecutionSink;

#[async_trait]
impl ExecutionSink for LoggingExecutionSink {
    async fn forward(&self, items: Vec<serde_json::Value>) -> Result<(), SinkError> {
        for item in &items {
            let event = item
                .get("event")
                .and_then(|e| e.as_str())
                .unwrap_or("<none>");
            info!(event = %event, "Accepted webhook event (no execution sink configured)");
        }
        Ok(())
    }
}

// ============================================================================
// ChannelExecutionSink
// ============================================================================

/// Sink that pushes accepted items into an in-process channel
///
/// The receiving half is handed to whatever consumes workflow executions.
/// Sending fails once the receiver has been dropped.
#[derive(Debug, Clone)]
pub struct ChannelExecutionSink {
    sender: mpsc::Sender<Vec<serde_json::Value>>,
}

impl ChannelExecutionSink {
    /// Create a sink and the receiver that observes it
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<Vec<serde_json::Value>>) {
        let (sender, receiver) = mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl ExecutionSink for ChannelExecutionSink {
    async fn forward(&self, items: Vec<serde_json::Value>) -> Result<(), SinkError> {
        self.sender
            .send(items)
            .await
            .map_err(|_| SinkError::Unavailable {
                message: "workflow consumer has shut down".to_string(),
            })
    }
}

#[cfg(test)]
#[path = "sink_tests.rs"]
mod tests;
