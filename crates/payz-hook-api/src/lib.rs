//! # Payz-Hook HTTP Service
//!
//! HTTP server for receiving PayzCore payment webhooks and handing verified
//! events to a workflow execution sink.
//!
//! This service provides:
//! - Webhook endpoint with HMAC signature verification, replay protection
//!   and event filtering
//! - Health and readiness endpoints
//! - Prometheus metrics endpoint

pub mod config;
pub mod errors;
pub mod metrics;
pub mod responses;

pub use config::{
    CredentialConfig, LoggingConfig, SecretSourceConfig, ServerConfig, ServiceConfig, SinkConfig,
    WebhookConfig,
};
pub use errors::{ConfigError, ServiceError, WebhookHandlerError};
pub use metrics::ServiceMetrics;
pub use responses::{HealthResponse, ReadinessResponse, WebhookResponse};

use axum::{
    extract::{DefaultBodyLimit, Extension, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use bytes::Bytes;
use payz_hook_core::{CorrelationId, RawRequest, Timestamp, VerificationOutcome, WebhookDispatcher};
use std::{net::SocketAddr, sync::Arc};
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};
use tracing::{error, info, instrument, warn};

/// Header used to propagate the request correlation id
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ============================================================================
// Application State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration for the service
    pub config: Arc<ServiceConfig>,

    /// Verifies requests and forwards accepted payloads
    pub dispatcher: Arc<WebhookDispatcher>,

    /// Metrics collector for observability
    pub metrics: Arc<ServiceMetrics>,
}

impl AppState {
    /// Create new application state
    pub fn new(
        config: ServiceConfig,
        dispatcher: WebhookDispatcher,
        metrics: Arc<ServiceMetrics>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            metrics,
        }
    }
}

// ============================================================================
// HTTP Server
// ============================================================================

/// Create HTTP router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let webhook_routes =
        Router::new().route(&state.config.webhook.endpoint_path, post(handle_webhook));

    let health_routes = Router::new()
        .route("/health", get(handle_health_check))
        .route("/ready", get(handle_readiness_check));

    let observability_routes = Router::new().route("/metrics", get(metrics_endpoint));

    let max_body_size = state.config.server.max_body_size;

    Router::new()
        .merge(webhook_routes)
        .merge(health_routes)
        .merge(observability_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(request_logging_middleware))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_body_size))
                .into_inner(),
        )
        .with_state(state)
}

/// Start HTTP server
pub async fn start_server(
    config: ServiceConfig,
    dispatcher: WebhookDispatcher,
) -> Result<(), ServiceError> {
    let metrics = ServiceMetrics::new().map_err(|e| {
        ServiceError::Configuration(ConfigError::Invalid {
            message: format!("Failed to initialize metrics: {}", e),
        })
    })?;

    let address = format!("{}:{}", config.server.host, config.server.port);
    let addr: SocketAddr = address.parse().map_err(|e| ServiceError::BindFailed {
        address: address.clone(),
        message: format!("invalid socket address: {}", e),
    })?;
    let shutdown_timeout = std::time::Duration::from_secs(config.server.shutdown_timeout_seconds);

    let state = AppState::new(config, dispatcher, metrics);
    let app = create_router(state);

    let listener =
        tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServiceError::BindFailed {
                address: addr.to_string(),
                message: e.to_string(),
            })?;

    info!("Starting HTTP server on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_timeout))
        .await
        .map_err(|e| ServiceError::ServerFailed {
            message: e.to_string(),
        })?;

    info!("HTTP server shutdown complete");
    Ok(())
}

/// Resolve when SIGINT or SIGTERM is received
///
/// A handler that cannot be installed never resolves; the other signal
/// still works.
async fn shutdown_signal(shutdown_timeout: std::time::Duration) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C signal handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown with {}s timeout", shutdown_timeout.as_secs());
        },
    }
}

// ============================================================================
// Webhook Handler
// ============================================================================

/// Handle PayzCore webhook requests
///
/// Reads the signature and timestamp headers and hands the raw body to the
/// dispatcher. The body is only parsed as JSON once the request has been
/// authenticated.
///
/// | Outcome | Response |
/// |---------|----------|
/// | accepted | `200` JSON `{"status":"accepted","correlation_id":...}` |
/// | filtered | `200` text `Event filtered` |
/// | rejected | `401` text reason |
/// | authenticated, body not JSON | `400` |
#[instrument(skip(state, correlation_id, headers, body), fields(correlation_id = %correlation_id))]
pub async fn handle_webhook(
    State(state): State<AppState>,
    Extension(correlation_id): Extension<CorrelationId>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, WebhookHandlerError> {
    let start = std::time::Instant::now();
    let webhook_config = &state.config.webhook;

    let signature = header_value(&headers, &webhook_config.signature_header);
    let timestamp = header_value(&headers, &webhook_config.timestamp_header);

    let request = RawRequest::from_wire(body, signature, timestamp)
        .with_correlation_id(correlation_id.clone());

    let outcome = state
        .dispatcher
        .dispatch(request)
        .await
        .inspect_err(|_| state.metrics.record_error())?;

    state.metrics.record_outcome(&outcome, start.elapsed());

    let response = match outcome {
        VerificationOutcome::Accepted(_) => {
            (StatusCode::OK, Json(WebhookResponse::accepted(correlation_id.to_string())))
                .into_response()
        }
        VerificationOutcome::RejectedFiltered => plain_text(StatusCode::OK, "Event filtered"),
        VerificationOutcome::RejectedUnauthenticated(reason) => {
            warn!(reason = reason.as_label(), "Webhook rejected");
            let status =
                StatusCode::from_u16(reason.status_code()).unwrap_or(StatusCode::UNAUTHORIZED);
            plain_text(status, reason.reason())
        }
    };

    Ok(response)
}

/// Header value as a string; invalid UTF-8 is kept lossily so it fails
/// verification instead of looking absent
fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name.to_ascii_lowercase().as_str())
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
}

fn plain_text(status: StatusCode, body: &'static str) -> Response {
    (
        status,
        [(CONTENT_TYPE, HeaderValue::from_static("text/plain; charset=utf-8"))],
        body,
    )
        .into_response()
}

// ============================================================================
// Health Check Handlers
// ============================================================================

/// Liveness check
async fn handle_health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: Timestamp::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check
///
/// Not ready while verification is enabled and the webhook secret cannot
/// be fetched.
#[instrument(skip(state))]
async fn handle_readiness_check(State(state): State<AppState>) -> Response {
    match state.dispatcher.verifier().check_credentials().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                ready: true,
                timestamp: Timestamp::now(),
                reason: None,
            }),
        )
            .into_response(),
        Err(e) => {
            warn!(error = %e, "Service not ready: webhook secret unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    ready: false,
                    timestamp: Timestamp::now(),
                    reason: Some("webhook secret unavailable".to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// Prometheus metrics endpoint
#[instrument(skip_all)]
async fn metrics_endpoint(State(state): State<AppState>) -> Result<String, StatusCode> {
    state
        .metrics
        .encode()
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

// ============================================================================
// Middleware
// ============================================================================

/// Request logging middleware
///
/// - Honours an incoming `x-correlation-id` when it is a UUID, otherwise
///   generates one
/// - Makes the id available to handlers as a request extension
/// - Echoes it on the response and logs request start and completion
#[instrument(skip(request, next), fields(
    method = %request.method(),
    uri = %request.uri(),
    correlation_id
))]
async fn request_logging_middleware(
    mut request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<CorrelationId>().ok())
        .unwrap_or_default();

    let correlation_id_text = correlation_id.to_string();
    tracing::Span::current().record("correlation_id", correlation_id_text.as_str());

    request.extensions_mut().insert(correlation_id.clone());

    info!(
        correlation_id = %correlation_id,
        method = %method,
        uri = %uri,
        "Request started"
    );

    let mut response = next.run(request).await;
    let duration = start.elapsed();

    if let Ok(header_value) = HeaderValue::from_str(&correlation_id_text) {
        response
            .headers_mut()
            .insert(CORRELATION_ID_HEADER, header_value);
    }

    let status = response.status();

    if status.is_server_error() {
        error!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with server error"
        );
    } else if status.is_client_error() {
        warn!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed with client error"
        );
    } else {
        info!(
            correlation_id = %correlation_id,
            method = %method,
            uri = %uri,
            status = %status,
            duration_ms = %duration.as_millis(),
            "Request completed successfully"
        );
    }

    response
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
