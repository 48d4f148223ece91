//! # Payz-Hook Service
//!
//! Binary entry point for the PayzCore webhook receiver.
//!
//! This executable:
//! - Loads configuration from files and environment
//! - Initializes structured logging
//! - Wires the credential store, verifier and execution sink
//! - Starts the HTTP server from payz-hook-api

mod configuration;
mod http_sink;

use configuration::{init_logging, load_config, CONFIG_FILE_ENV};
use http_sink::HttpExecutionSink;
use payz_hook_api::{start_server, LoggingConfig, ServiceConfig, SinkConfig};
use payz_hook_core::{
    ExecutionSink, LoggingExecutionSink, SinkError, WebhookDispatcher, WebhookVerifier,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Exit code for configuration failures
const CONFIG_EXIT_CODE: i32 = 3;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let explicit_path = std::env::var(CONFIG_FILE_ENV).ok();
    let loaded = load_config(explicit_path.as_deref()).and_then(|config| {
        config.validate()?;
        Ok(config)
    });

    let logging = loaded
        .as_ref()
        .map(|config| config.logging.clone())
        .unwrap_or_else(|_| LoggingConfig::default());
    init_logging(&logging);

    let config: ServiceConfig = match loaded {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Failed to load service configuration");
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    info!(
        port = config.server.port,
        endpoint = %config.webhook.endpoint_path,
        "Starting Payz-Hook Service"
    );

    let verifier_config = match config.verifier_config() {
        Ok(verifier_config) => verifier_config,
        Err(e) => {
            error!(error = %e, "Invalid webhook configuration");
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    let sink = match build_sink(&config.sink) {
        Ok(sink) => sink,
        Err(e) => {
            error!(error = %e, "Failed to create execution sink");
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };

    let verifier = WebhookVerifier::new(verifier_config, config.credential_store());

    // The secret may be provisioned after start-up; readiness reports it until then.
    if let Err(e) = verifier.check_credentials().await {
        warn!(error = %e, "Webhook secret is not yet available");
    }

    let dispatcher = WebhookDispatcher::new(verifier, sink);

    if let Err(e) = start_server(config, dispatcher).await {
        error!(error = %e, "Server terminated with error");
        std::process::exit(e.exit_code());
    }

    Ok(())
}

fn build_sink(config: &SinkConfig) -> Result<Arc<dyn ExecutionSink>, SinkError> {
    match config {
        SinkConfig::Log => {
            info!("Accepted events will be logged only");
            Ok(Arc::new(LoggingExecutionSink))
        }
        SinkConfig::Http {
            url,
            timeout_seconds,
        } => {
            let sink = HttpExecutionSink::new(url.clone(), Duration::from_secs(*timeout_seconds))?;
            info!(url = %sink.url(), "Accepted events will be posted to the workflow endpoint");
            Ok(Arc::new(sink))
        }
    }
}
