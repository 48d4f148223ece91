//! Execution sink that starts workflows over HTTP.

use async_trait::async_trait;
use payz_hook_core::{ExecutionSink, SinkError};
use std::time::Duration;
use tracing::{debug, instrument};

/// Posts accepted items as a JSON array to a workflow engine endpoint
///
/// Transport failures, timeouts and `5xx` answers are reported as
/// [`SinkError::Unavailable`]; any other non-success status as
/// [`SinkError::Rejected`].
#[derive(Debug, Clone)]
pub struct HttpExecutionSink {
    client: reqwest::Client,
    url: String,
}

impl HttpExecutionSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("payz-hook/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SinkError::Unavailable {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ExecutionSink for HttpExecutionSink {
    #[instrument(skip(self, items), fields(url = %self.url, items = items.len()))]
    async fn forward(&self, items: Vec<serde_json::Value>) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.url)
            .json(&items)
            .send()
            .await
            .map_err(|e| SinkError::Unavailable {
                message: e.to_string(),
            })?;

        let status = response.status();
        if status.is_success() {
            debug!(status = %status, "Workflow execution started");
            return Ok(());
        }

        let message = format!("workflow endpoint answered {}", status);
        if status.is_server_error() {
            Err(SinkError::Unavailable { message })
        } else {
            Err(SinkError::Rejected { message })
        }
    }
}

#[cfg(test)]
#[path = "http_sink_tests.rs"]
mod tests;
