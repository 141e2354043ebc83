//! Types for the publish orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Job not found (never submitted, or already reset).
    #[error("job not found: {0}")]
    JobNotFound(String),

    /// Job is in the wrong state for the requested operation.
    #[error("invalid job state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// The submitted request failed validation. No job was created and no
    /// channel status was touched.
    #[error("validation failed: {0}")]
    Validation(#[from] crate::publish::ValidationError),

    /// Channel registry error.
    #[error("channel registry error: {0}")]
    Registry(#[from] crate::channel::ChannelError),

    /// Orchestrator is shutting down and no longer accepts work.
    #[error("orchestrator is shutting down")]
    ShuttingDown,
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether the orchestrator accepts new jobs.
    pub running: bool,
    /// Jobs launched and still in flight.
    pub active_jobs: usize,
    /// Jobs waiting for their scheduled launch time.
    pub scheduled_jobs: usize,
    /// Jobs where every channel has reached a terminal status.
    pub completed_jobs: usize,
    /// Channels currently uploading, across all jobs.
    pub uploading_channels: usize,
}
