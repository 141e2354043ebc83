//! Publish orchestrator for multi-channel distribution.
//!
//! The orchestrator takes one validated publish request and drives every
//! target channel through the per-channel state machine:
//! - **Validation**: all-or-nothing against the channel registry
//! - **Launch**: immediate, or deferred to a scheduled instant
//! - **Upload**: one independent task per channel, a slow or failing
//!   channel never blocks the others

mod config;
mod runner;
mod types;

pub use config::OrchestratorConfig;
pub use runner::PublishOrchestrator;
pub use types::{OrchestratorError, OrchestratorStatus};
