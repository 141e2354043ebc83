//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the ContentFlow server:
//! - HTTP request metrics (latency, counts, errors)
//! - Publish orchestrator status (collected dynamically)
//! - Channel registry gauges (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "contentflow_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("contentflow_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "contentflow_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

/// Authentication failures.
pub static AUTH_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "contentflow_auth_failures_total",
            "Total authentication failures",
        ),
        &["reason"],
    )
    .unwrap()
});

// =============================================================================
// Orchestrator Metrics (collected dynamically)
// =============================================================================

/// Orchestrator accepting jobs (1 = accepting, 0 = shutting down).
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "contentflow_orchestrator_running",
        "Whether the orchestrator is accepting jobs (1) or shutting down (0)",
    )
    .unwrap()
});

/// Jobs with at least one channel still publishing.
pub static JOBS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "contentflow_jobs_active",
        "Number of jobs with uploads in flight",
    )
    .unwrap()
});

/// Jobs waiting for their scheduled launch time.
pub static JOBS_SCHEDULED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "contentflow_jobs_scheduled",
        "Number of jobs waiting for their scheduled time",
    )
    .unwrap()
});

/// Channels currently in the uploading state across all jobs.
pub static CHANNELS_UPLOADING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "contentflow_channels_uploading",
        "Number of channel uploads currently in flight",
    )
    .unwrap()
});

// =============================================================================
// Channel Registry Metrics (collected dynamically)
// =============================================================================

/// Connected channels by connection status.
pub static CHANNELS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new(
            "contentflow_channels_by_status",
            "Current channel count by connection status",
        ),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();
    registry
        .register(Box::new(AUTH_FAILURES_TOTAL.clone()))
        .unwrap();

    // Orchestrator
    registry
        .register(Box::new(ORCHESTRATOR_RUNNING.clone()))
        .unwrap();
    registry.register(Box::new(JOBS_ACTIVE.clone())).unwrap();
    registry.register(Box::new(JOBS_SCHEDULED.clone())).unwrap();
    registry
        .register(Box::new(CHANNELS_UPLOADING.clone()))
        .unwrap();

    // Channel registry
    registry
        .register(Box::new(CHANNELS_BY_STATUS.clone()))
        .unwrap();

    // Core metrics (jobs, uploads, captions)
    for metric in contentflow_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding metrics to update gauges with current values from
/// the orchestrator and the channel registry.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().status().await;
    ORCHESTRATOR_RUNNING.set(if status.running { 1 } else { 0 });
    JOBS_ACTIVE.set(status.active_jobs as i64);
    JOBS_SCHEDULED.set(status.scheduled_jobs as i64);
    CHANNELS_UPLOADING.set(status.uploading_channels as i64);

    for connection_status in [
        contentflow_core::ConnectionStatus::Active,
        contentflow_core::ConnectionStatus::Disconnected,
    ] {
        let filter =
            contentflow_core::ChannelFilter::new().with_connection_status(connection_status);
        if let Ok(count) = state.registry().count(&filter) {
            CHANNELS_BY_STATUS
                .with_label_values(&[connection_status.as_str()])
                .set(count);
        }
    }
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    let uuid_regex = regex_lite::Regex::new(
        r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
    )
    .unwrap();
    let numeric_regex = regex_lite::Regex::new(r"/\d+(/|$)").unwrap();

    let result = uuid_regex.replace_all(path, "{id}");
    let result = numeric_regex.replace_all(&result, "/{id}$1");
    result.to_string()
}
