//! Response types for the API.

use payz_hook_core::Timestamp;
use serde::Serialize;

/// Body returned when a webhook is accepted and forwarded
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    pub status: String,
    pub correlation_id: String,
}

impl WebhookResponse {
    pub fn accepted(correlation_id: String) -> Self {
        Self {
            status: "accepted".to_string(),
            correlation_id,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: Timestamp,
    pub version: String,
}

/// Readiness check response
#[derive(Debug, Serialize)]
pub struct ReadinessResponse {
    pub ready: bool,
    pub timestamp: Timestamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}
