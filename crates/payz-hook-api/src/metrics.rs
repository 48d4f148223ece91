//! Prometheus metrics for the webhook endpoint.

use payz_hook_core::{RejectionReason, VerificationOutcome};
use prometheus::{Histogram, HistogramOpts, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Service metrics for observability
///
/// Metrics live in a registry owned by this instance rather than the
/// process-global default, so several routers can coexist in one process.
#[derive(Debug)]
pub struct ServiceMetrics {
    registry: Registry,

    /// `payz_webhook_requests_total{outcome}`
    pub webhook_requests_total: IntCounterVec,

    /// `payz_webhook_rejections_total{reason}`
    pub webhook_rejections_total: IntCounterVec,

    pub webhook_duration_seconds: Histogram,
}

impl ServiceMetrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        let registry = Registry::new();

        let webhook_requests_total = IntCounterVec::new(
            Opts::new(
                "payz_webhook_requests_total",
                "Webhook requests by verification outcome",
            ),
            &["outcome"],
        )?;
        let webhook_rejections_total = IntCounterVec::new(
            Opts::new(
                "payz_webhook_rejections_total",
                "Rejected webhook requests by reason",
            ),
            &["reason"],
        )?;
        let webhook_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "payz_webhook_duration_seconds",
                "Webhook verification and dispatch time",
            )
            .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;

        registry.register(Box::new(webhook_requests_total.clone()))?;
        registry.register(Box::new(webhook_rejections_total.clone()))?;
        registry.register(Box::new(webhook_duration_seconds.clone()))?;

        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        Ok(Arc::new(Self {
            registry,
            webhook_requests_total,
            webhook_rejections_total,
            webhook_duration_seconds,
        }))
    }

    /// Record a verification outcome and how long it took
    pub fn record_outcome(&self, outcome: &VerificationOutcome, duration: std::time::Duration) {
        self.webhook_requests_total
            .with_label_values(&[outcome.as_label()])
            .inc();
        if let VerificationOutcome::RejectedUnauthenticated(reason) = outcome {
            self.record_rejection(*reason);
        }
        self.webhook_duration_seconds
            .observe(duration.as_secs_f64());
    }

    fn record_rejection(&self, reason: RejectionReason) {
        self.webhook_rejections_total
            .with_label_values(&[reason.as_label()])
            .inc();
    }

    /// Record a request that ended without a verdict
    pub fn record_error(&self) {
        self.webhook_requests_total
            .with_label_values(&["error"])
            .inc();
    }

    /// Render every metric in the Prometheus text format
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

#[cfg(test)]
#[path = "metrics_tests.rs"]
mod tests;
