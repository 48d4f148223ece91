//! Error types for the HTTP service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use payz_hook_core::WebhookError;
use tracing::{error, warn};

/// Webhook handler errors with HTTP status code mapping
///
/// Rejections and filtered events are not errors; they are ordinary
/// outcomes rendered by the handler. This type covers the cases where no
/// verdict could be reached:
///
/// - `400 Bad Request`: the authenticated body is not valid JSON
/// - `500 Internal Server Error`: the webhook secret is unavailable while
///   verification is enabled
/// - `502 Bad Gateway`: the execution sink refused the accepted payload
///
/// Messages returned to the caller are generic. Details are logged
/// server-side with the correlation id.
#[derive(Debug, thiserror::Error)]
pub enum WebhookHandlerError {
    /// Verification or dispatch failed before a verdict
    #[error("Processing failed: {0}")]
    ProcessingFailed(#[from] WebhookError),
}

impl IntoResponse for WebhookHandlerError {
    fn into_response(self) -> Response {
        let (status, message, retry_after) = match self {
            Self::ProcessingFailed(WebhookError::MalformedPayload { ref message }) => {
                warn!(error = %message, "Rejected webhook with malformed JSON body");
                (StatusCode::BAD_REQUEST, "Malformed JSON payload".to_string(), None)
            }
            Self::ProcessingFailed(WebhookError::Configuration(ref e)) => {
                error!(
                    error = %e,
                    "Webhook secret unavailable while signature verification is enabled; \
                     add the secret or disable verification"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Webhook verification is not configured".to_string(),
                    None,
                )
            }
            Self::ProcessingFailed(WebhookError::Sink(ref e)) => {
                error!(error = %e, "Execution sink failed to accept payload");
                let retry_after = e.is_transient().then_some(30);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to start workflow execution".to_string(),
                    retry_after,
                )
            }
        };

        let body = serde_json::json!({
            "error": message,
            "status": status.as_u16(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        let mut response = (status, Json(body)).into_response();

        if let Some(retry_seconds) = retry_after {
            if let Ok(header_value) = retry_seconds.to_string().parse() {
                response.headers_mut().insert("Retry-After", header_value);
            }
        }

        response
    }
}

/// Service-level errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Failed to bind to address {address}: {message}")]
    BindFailed { address: String, message: String },

    #[error("Server failed: {message}")]
    ServerFailed { message: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl ServiceError {
    /// Process exit code for this failure
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::BindFailed { .. } => 1,
            Self::ServerFailed { .. } => 2,
            Self::Configuration(_) => 3,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Configuration loading failed: {message}")]
    Loading { message: String },
}

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;
