//! Configuration types for the HTTP service
//!
//! Every field carries a serde default so a partial file, or no file at all,
//! still produces a usable configuration.

use crate::errors::ConfigError;
use payz_hook_core::{
    webhook::{SIGNATURE_HEADER, TIMESTAMP_HEADER},
    CredentialId, CredentialStore, EnvironmentCredentialStore, EventSubscription,
    InMemoryCredentialStore, MissingTimestampPolicy, SecretValue, UnverifiableBodyPolicy,
    VerifierConfig,
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration};
use tracing::warn;

/// Service configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// HTTP server settings
    pub server: ServerConfig,

    /// Webhook verification settings
    pub webhook: WebhookConfig,

    /// Credential records holding webhook secrets
    pub credentials: Vec<CredentialConfig>,

    /// Where accepted payloads are sent
    pub sink: SinkConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl ServiceConfig {
    /// Check the configuration for values the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Invalid {
                message: "server.port must be non-zero".to_string(),
            });
        }

        if self.server.max_body_size == 0 {
            return Err(ConfigError::Invalid {
                message: "server.max_body_size must be non-zero".to_string(),
            });
        }

        self.webhook.validate()?;

        for credential in &self.credentials {
            credential.validate()?;
        }

        if self.webhook.verify_signature && self.verification_credential().is_none() {
            return Err(ConfigError::Missing {
                key: format!(
                    "credentials entry with id '{}' (required while webhook.verify_signature is enabled)",
                    self.webhook.credential_id
                ),
            });
        }

        self.sink.validate()
    }

    /// Credential record used to verify webhook signatures
    pub fn verification_credential(&self) -> Option<&CredentialConfig> {
        self.credentials
            .iter()
            .find(|c| c.id == self.webhook.credential_id)
    }

    /// Build the credential store backing signature verification
    ///
    /// An undeclared credential yields an empty store, so verification
    /// fails with a configuration error at request time.
    pub fn credential_store(&self) -> Arc<dyn CredentialStore> {
        match self.verification_credential() {
            Some(credential) => credential.build_store(),
            None => Arc::new(InMemoryCredentialStore::new()),
        }
    }

    /// Verifier settings derived from the `webhook` section
    pub fn verifier_config(&self) -> Result<VerifierConfig, ConfigError> {
        let subscription = EventSubscription::new(self.webhook.events.iter().cloned())
            .map_err(|e| ConfigError::Invalid {
                message: format!("webhook.events: {}", e),
            })?;

        Ok(VerifierConfig::new(self.webhook.credential_id.clone())
            .with_verify_signature(self.webhook.verify_signature)
            .with_tolerance(Duration::from_secs(self.webhook.tolerance_seconds))
            .with_subscription(subscription)
            .with_missing_timestamp(self.webhook.missing_timestamp)
            .with_unverifiable_body(self.webhook.unverifiable_body))
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,

    /// Maximum request size in bytes
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_timeout_seconds: 30,
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

/// Webhook verification configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    /// Webhook endpoint path
    pub endpoint_path: String,

    /// Require a valid HMAC signature
    pub verify_signature: bool,

    /// Accepted clock skew for the signed timestamp
    pub tolerance_seconds: u64,

    /// Subscribed event names
    pub events: Vec<String>,

    pub signature_header: String,
    pub timestamp_header: String,

    pub missing_timestamp: MissingTimestampPolicy,
    pub unverifiable_body: UnverifiableBodyPolicy,

    /// Credential record holding the webhook secret
    pub credential_id: CredentialId,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        let verifier = VerifierConfig::default();
        Self {
            endpoint_path: "/webhook".to_string(),
            verify_signature: verifier.verify_signature,
            tolerance_seconds: verifier.tolerance.as_secs(),
            events: verifier
                .subscription
                .events()
                .map(str::to_string)
                .collect(),
            signature_header: SIGNATURE_HEADER.to_string(),
            timestamp_header: TIMESTAMP_HEADER.to_string(),
            missing_timestamp: verifier.missing_timestamp,
            unverifiable_body: verifier.unverifiable_body,
            credential_id: verifier.credential_id,
        }
    }
}

impl WebhookConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.endpoint_path.starts_with('/') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "webhook.endpoint_path must start with '/', got '{}'",
                    self.endpoint_path
                ),
            });
        }

        if self.tolerance_seconds == 0 {
            return Err(ConfigError::Invalid {
                message: "webhook.tolerance_seconds must be non-zero".to_string(),
            });
        }

        if self.events.is_empty() {
            return Err(ConfigError::Invalid {
                message: "webhook.events must name at least one event".to_string(),
            });
        }

        for (key, name) in [
            ("webhook.signature_header", &self.signature_header),
            ("webhook.timestamp_header", &self.timestamp_header),
        ] {
            if axum::http::HeaderName::from_bytes(name.as_bytes()).is_err() {
                return Err(ConfigError::Invalid {
                    message: format!("{} is not a valid header name: '{}'", key, name),
                });
            }
        }

        Ok(())
    }
}

/// A credential record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub id: CredentialId,
    pub webhook_secret: SecretSourceConfig,
}

impl CredentialConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match &self.webhook_secret {
            SecretSourceConfig::Literal { value } if value.is_empty() => {
                Err(ConfigError::Invalid {
                    message: format!("credential '{}': literal webhook_secret is empty", self.id),
                })
            }
            SecretSourceConfig::Environment { variable } if variable.trim().is_empty() => {
                Err(ConfigError::Invalid {
                    message: format!(
                        "credential '{}': webhook_secret.variable must not be empty",
                        self.id
                    ),
                })
            }
            _ => Ok(()),
        }
    }

    /// Credential store serving this record's secret
    pub fn build_store(&self) -> Arc<dyn CredentialStore> {
        match &self.webhook_secret {
            SecretSourceConfig::Literal { value } => {
                warn!(
                    credential = %self.id,
                    "Webhook secret is configured as a literal value; \
                     prefer an environment variable outside local development"
                );
                let store = InMemoryCredentialStore::new();
                store.add_secret(self.id.clone(), SecretValue::from_string(value.clone()));
                Arc::new(store)
            }
            SecretSourceConfig::Environment { variable } => Arc::new(
                EnvironmentCredentialStore::new().bind(self.id.clone(), variable.clone()),
            ),
        }
    }
}

/// Where a webhook secret comes from
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecretSourceConfig {
    /// Secret embedded in the configuration file
    Literal { value: String },

    /// Secret read from an environment variable on every request
    Environment { variable: String },
}

// Security: the literal value must never reach the logs
impl std::fmt::Debug for SecretSourceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Literal { .. } => f
                .debug_struct("Literal")
                .field("value", &"<REDACTED>")
                .finish(),
            Self::Environment { variable } => f
                .debug_struct("Environment")
                .field("variable", variable)
                .finish(),
        }
    }
}

/// Execution sink selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SinkConfig {
    /// Log accepted events and do nothing else
    #[default]
    Log,

    /// POST accepted events to a workflow engine
    Http {
        url: String,
        #[serde(default = "default_sink_timeout")]
        timeout_seconds: u64,
    },
}

fn default_sink_timeout() -> u64 {
    10
}

impl SinkConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Log => Ok(()),
            Self::Http { url, timeout_seconds } => {
                if !(url.starts_with("http://") || url.starts_with("https://")) {
                    return Err(ConfigError::Invalid {
                        message: format!("sink.url must be an http(s) URL, got '{}'", url),
                    });
                }
                if *timeout_seconds == 0 {
                    return Err(ConfigError::Invalid {
                        message: "sink.timeout_seconds must be non-zero".to_string(),
                    });
                }
                Ok(())
            }
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,

    /// Enable JSON structured logging
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
