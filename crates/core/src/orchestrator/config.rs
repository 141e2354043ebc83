//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the publish orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Base latency of the simulated transport (milliseconds).
    /// Real transports ignore this; the simulated one sleeps this long
    /// per upload.
    #[serde(default = "default_base_latency")]
    pub base_latency_ms: u64,

    /// Per-target completion stagger (milliseconds).
    /// The upload task for the target at position i waits i * stagger_ms
    /// before starting, so earlier targets finish no later than later
    /// ones. Set to 0 to launch all uploads at once.
    #[serde(default = "default_stagger")]
    pub stagger_ms: u64,

    /// Maximum upload attempts per channel, including the first.
    /// Only retryable transport errors are retried.
    #[serde(default = "default_max_attempts")]
    pub max_upload_attempts: u32,

    /// Initial backoff between retries (milliseconds), doubled per attempt.
    #[serde(default = "default_retry_backoff")]
    pub retry_backoff_ms: u64,

    /// Per-attempt upload timeout (milliseconds).
    /// A timed-out attempt counts as a retryable failure.
    #[serde(default = "default_upload_timeout")]
    pub upload_timeout_ms: u64,
}

fn default_base_latency() -> u64 {
    2000 // 2 seconds
}

fn default_stagger() -> u64 {
    1000 // 1 second per target index
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_backoff() -> u64 {
    500
}

fn default_upload_timeout() -> u64 {
    30_000 // 30 seconds
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            base_latency_ms: default_base_latency(),
            stagger_ms: default_stagger(),
            max_upload_attempts: default_max_attempts(),
            retry_backoff_ms: default_retry_backoff(),
            upload_timeout_ms: default_upload_timeout(),
        }
    }
}
