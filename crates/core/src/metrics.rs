//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Publish orchestrator (jobs, per-channel uploads, retries)
//! - Channel registry (connects, disconnects)
//! - Caption generation (LLM calls, tokens)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Publish Job Metrics
// =============================================================================

/// Publish jobs submitted total by schedule mode.
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "contentflow_jobs_submitted_total",
            "Total publish jobs submitted",
        ),
        &["schedule"], // "now", "later"
    )
    .unwrap()
});

/// Publish jobs rejected at validation.
pub static JOBS_REJECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "contentflow_jobs_rejected_total",
        "Total publish jobs rejected at validation",
    )
    .unwrap()
});

/// Publish jobs completed total.
pub static JOBS_COMPLETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "contentflow_jobs_completed_total",
        "Total publish jobs where every channel reached a terminal status",
    )
    .unwrap()
});

/// Publish jobs cancelled in flight.
pub static JOBS_CANCELLED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "contentflow_jobs_cancelled_total",
        "Total publish jobs cancelled",
    )
    .unwrap()
});

/// Job duration from launch to completion in seconds.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "contentflow_job_duration_seconds",
            "Duration of publish jobs from launch to completion",
        )
        .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0, 300.0]),
        &[],
    )
    .unwrap()
});

// =============================================================================
// Per-Channel Upload Metrics
// =============================================================================

/// Upload attempts total by platform and result.
pub static UPLOAD_ATTEMPTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "contentflow_upload_attempts_total",
            "Total per-channel upload attempts",
        ),
        &["platform", "result"], // result: "success", "retryable_error", "permanent_error"
    )
    .unwrap()
});

/// Upload attempt duration in seconds.
pub static UPLOAD_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "contentflow_upload_duration_seconds",
            "Duration of per-channel upload attempts",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        &["platform"],
    )
    .unwrap()
});

/// Upload retries total by platform.
pub static UPLOAD_RETRIES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "contentflow_upload_retries_total",
            "Total upload retries after retryable failures",
        ),
        &["platform"],
    )
    .unwrap()
});

// =============================================================================
// Channel Registry Metrics
// =============================================================================

/// Channels connected total by platform.
pub static CHANNELS_CONNECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "contentflow_channels_connected_total",
            "Total channels connected",
        ),
        &["platform"],
    )
    .unwrap()
});

/// Channels disconnected total by platform.
pub static CHANNELS_DISCONNECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "contentflow_channels_disconnected_total",
            "Total channels disconnected",
        ),
        &["platform"],
    )
    .unwrap()
});

// =============================================================================
// Caption Generation Metrics
// =============================================================================

/// Caption generation requests total by provider and status.
pub static CAPTION_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "contentflow_caption_requests_total",
            "Total caption generation requests",
        ),
        &["provider", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Caption generation duration in seconds.
pub static CAPTION_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "contentflow_caption_duration_seconds",
            "Duration of caption generation calls",
        )
        .buckets(vec![0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["provider"],
    )
    .unwrap()
});

/// LLM tokens used.
pub static LLM_TOKENS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("contentflow_llm_tokens_total", "Total LLM tokens used"),
        &["provider", "direction"], // direction: "input", "output"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_REJECTED.clone()),
        Box::new(JOBS_COMPLETED.clone()),
        Box::new(JOBS_CANCELLED.clone()),
        Box::new(JOB_DURATION.clone()),
        // Uploads
        Box::new(UPLOAD_ATTEMPTS.clone()),
        Box::new(UPLOAD_DURATION.clone()),
        Box::new(UPLOAD_RETRIES.clone()),
        // Channels
        Box::new(CHANNELS_CONNECTED.clone()),
        Box::new(CHANNELS_DISCONNECTED.clone()),
        // Captions
        Box::new(CAPTION_REQUESTS.clone()),
        Box::new(CAPTION_DURATION.clone()),
        Box::new(LLM_TOKENS.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_metrics_register_cleanly() {
        let registry = prometheus::Registry::new();
        for metric in all_metrics() {
            registry.register(metric).unwrap();
        }
    }

    #[test]
    fn test_upload_attempt_labels() {
        UPLOAD_ATTEMPTS
            .with_label_values(&["tiktok", "success"])
            .inc();
        assert!(
            UPLOAD_ATTEMPTS
                .with_label_values(&["tiktok", "success"])
                .get()
                >= 1
        );
    }
}
