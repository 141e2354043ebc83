//! Publish job API handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use contentflow_core::{
    Asset, OrchestratorError, OrchestratorStatus, PublishJob, PublishRequest, PublishStatus,
    ScheduleMode, ValidationError,
};

use super::middleware::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for submitting a publish job
#[derive(Debug, Deserialize)]
pub struct SubmitJobBody {
    pub asset: Asset,
    /// Post title; defaults to the asset file name when omitted
    pub title: Option<String>,
    /// Caption text, including any hashtags
    pub caption: String,
    /// Target channel ids
    pub channel_ids: Vec<String>,
    /// When to launch; defaults to immediately
    pub schedule: Option<SubmitSchedule>,
}

/// Schedule as submitted on the wire. The timestamp is optional here so a
/// `later` submission without one gets a structured validation error
/// instead of a body deserialization reject.
#[derive(Debug, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SubmitSchedule {
    Now,
    Later {
        #[serde(default)]
        scheduled_for: Option<DateTime<Utc>>,
    },
}

/// Response for a submitted job
#[derive(Debug, Serialize)]
pub struct SubmitJobResponse {
    pub job_id: String,
}

/// Response for listing jobs
#[derive(Debug, Serialize)]
pub struct ListJobsResponse {
    pub jobs: Vec<PublishJob>,
    pub total: usize,
}

/// Response for a cancelled job
#[derive(Debug, Serialize)]
pub struct CancelJobResponse {
    pub job_id: String,
    /// Channels that were still in flight when the cancel landed
    pub channels_cancelled: usize,
}

/// Response for a reset job
#[derive(Debug, Serialize)]
pub struct ResetJobResponse {
    pub job_id: String,
}

/// Orchestrator status plus the global publishing flag
#[derive(Debug, Serialize)]
pub struct PublishStatusResponse {
    #[serde(flatten)]
    pub status: OrchestratorStatus,
    pub is_publishing: bool,
}

/// Per-channel publish status
#[derive(Debug, Serialize)]
pub struct ChannelStatusResponse {
    pub channel_id: String,
    pub status: PublishStatus,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct PublishErrorResponse {
    pub error: String,
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
) -> (StatusCode, Json<PublishErrorResponse>) {
    (
        status,
        Json(PublishErrorResponse {
            error: error.into(),
        }),
    )
}

fn map_orchestrator_error(e: OrchestratorError) -> (StatusCode, Json<PublishErrorResponse>) {
    match e {
        OrchestratorError::Validation(_) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        OrchestratorError::JobNotFound(id) => {
            error_response(StatusCode::NOT_FOUND, format!("Job not found: {}", id))
        }
        OrchestratorError::InvalidState { .. } => {
            error_response(StatusCode::CONFLICT, e.to_string())
        }
        OrchestratorError::ShuttingDown => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, e.to_string())
        }
        OrchestratorError::Registry(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Submit a publish job.
///
/// The request is validated before any state is created; a rejected request
/// returns 400 and leaves no trace. An accepted job runs in the background
/// and is returned as 202 with its id.
pub async fn submit_job(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<SubmitJobBody>,
) -> Result<(StatusCode, Json<SubmitJobResponse>), impl IntoResponse> {
    let schedule = match body.schedule {
        None | Some(SubmitSchedule::Now) => ScheduleMode::Now,
        Some(SubmitSchedule::Later {
            scheduled_for: Some(scheduled_for),
        }) => ScheduleMode::Later { scheduled_for },
        Some(SubmitSchedule::Later {
            scheduled_for: None,
        }) => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                ValidationError::MissingScheduleTime.to_string(),
            ));
        }
    };

    let title = body
        .title
        .unwrap_or_else(|| body.asset.file_name.clone());

    let request = PublishRequest {
        asset: body.asset,
        title,
        caption: body.caption,
        channel_ids: body.channel_ids,
        schedule,
        requested_by: user_id,
    };

    match state.orchestrator().submit(request).await {
        Ok(job_id) => Ok((StatusCode::ACCEPTED, Json(SubmitJobResponse { job_id }))),
        Err(e) => Err(map_orchestrator_error(e)),
    }
}

/// Get a job by ID
pub async fn get_job(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PublishJob>, impl IntoResponse> {
    match state.orchestrator().job(&id).await {
        Some(job) => Ok(Json(job)),
        None => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Job not found: {}", id),
        )),
    }
}

/// List all jobs known to the orchestrator, newest first
pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<ListJobsResponse> {
    let jobs = state.orchestrator().jobs().await;
    let total = jobs.len();
    Json(ListJobsResponse { jobs, total })
}

/// Cancel a job (DELETE endpoint).
///
/// Channels that already reached a terminal state keep their outcome; the
/// rest fail as cancelled. Cancelling a scheduled job that has not launched
/// drops it entirely.
pub async fn cancel_job(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CancelJobResponse>, impl IntoResponse> {
    match state.orchestrator().cancel(&id, &user_id).await {
        Ok(channels_cancelled) => Ok(Json(CancelJobResponse {
            job_id: id,
            channels_cancelled,
        })),
        Err(e) => Err(map_orchestrator_error(e)),
    }
}

/// Reset a completed job so it can be retried
pub async fn reset_job(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ResetJobResponse>, impl IntoResponse> {
    match state.orchestrator().reset(&id, &user_id).await {
        Ok(()) => Ok(Json(ResetJobResponse { job_id: id })),
        Err(e) => Err(map_orchestrator_error(e)),
    }
}

/// Orchestrator status summary
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<PublishStatusResponse> {
    let status = state.orchestrator().status().await;
    let is_publishing = state.orchestrator().is_publishing().await;
    Json(PublishStatusResponse {
        status,
        is_publishing,
    })
}

/// Publish status of a single channel, taken from the most recent job that
/// targets it. Channels with no publish history report as ready.
pub async fn get_channel_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<ChannelStatusResponse> {
    let status = state.orchestrator().channel_status(&id).await;
    Json(ChannelStatusResponse {
        channel_id: id,
        status,
    })
}
