//! Channel registry API handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use contentflow_core::{
    metrics, AuditEvent, Channel, ChannelError, ChannelFilter, ConnectionStatus, Platform,
};

use super::middleware::AuthUser;
use crate::state::AppState;

/// Maximum allowed limit for channel queries
const MAX_LIMIT: i64 = 1000;

/// Default limit for channel queries
const DEFAULT_LIMIT: i64 = 100;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for connecting a channel
#[derive(Debug, Deserialize)]
pub struct ConnectChannelBody {
    pub platform: Platform,
    /// Display name of the account
    pub display_name: String,
    /// Platform handle, e.g. "@techdaily"
    pub handle: String,
    pub avatar_url: Option<String>,
    pub followers: Option<u64>,
}

/// Query parameters for listing channels
#[derive(Debug, Deserialize)]
pub struct ListChannelsParams {
    /// Filter by platform
    pub platform: Option<String>,
    /// Filter by connection status ("active" or "disconnected")
    pub status: Option<String>,
    /// Filter by the user who connected the channel
    pub created_by: Option<String>,
    /// Maximum number of channels to return
    pub limit: Option<i64>,
    /// Pagination offset
    pub offset: Option<i64>,
}

/// Request body for a metadata sync
#[derive(Debug, Default, Deserialize)]
pub struct SyncChannelBody {
    pub followers: Option<u64>,
    pub avatar_url: Option<String>,
}

/// Response for listing channels
#[derive(Debug, Serialize)]
pub struct ListChannelsResponse {
    pub channels: Vec<Channel>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ChannelErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> (StatusCode, Json<ChannelErrorResponse>) {
    (
        status,
        Json(ChannelErrorResponse {
            error: error.into(),
        }),
    )
}

fn map_channel_error(e: ChannelError) -> (StatusCode, Json<ChannelErrorResponse>) {
    match e {
        ChannelError::NotFound(id) => {
            error_response(StatusCode::NOT_FOUND, format!("Channel not found: {}", id))
        }
        ChannelError::InvalidStatus { .. } => error_response(StatusCode::CONFLICT, e.to_string()),
        ChannelError::Database(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Connect a new channel
pub async fn connect_channel(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<ConnectChannelBody>,
) -> Result<(StatusCode, Json<Channel>), impl IntoResponse> {
    let now = Utc::now();
    let channel = Channel {
        id: Uuid::new_v4().to_string(),
        platform: body.platform,
        display_name: body.display_name,
        handle: body.handle,
        avatar_url: body.avatar_url,
        followers: body.followers,
        connection_status: ConnectionStatus::Active,
        created_by: user_id.clone(),
        connected_at: now,
        last_synced_at: now,
    };

    match state.registry().connect(&channel) {
        Ok(()) => {
            metrics::CHANNELS_CONNECTED
                .with_label_values(&[channel.platform.as_str()])
                .inc();
            state.audit().try_emit(AuditEvent::ChannelConnected {
                user_id,
                channel_id: channel.id.clone(),
                platform: channel.platform.to_string(),
                handle: channel.handle.clone(),
            });

            Ok((StatusCode::CREATED, Json(channel)))
        }
        Err(e) => Err(map_channel_error(e)),
    }
}

/// Get a channel by ID
pub async fn get_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Channel>, impl IntoResponse> {
    match state.registry().get(&id) {
        Ok(Some(channel)) => Ok(Json(channel)),
        Ok(None) => Err(error_response(
            StatusCode::NOT_FOUND,
            format!("Channel not found: {}", id),
        )),
        Err(e) => Err(map_channel_error(e)),
    }
}

/// List channels with optional filters
pub async fn list_channels(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListChannelsParams>,
) -> Result<Json<ListChannelsResponse>, impl IntoResponse> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);
    let offset = params.offset.unwrap_or(0).max(0);

    let mut filter = ChannelFilter::new().with_limit(limit).with_offset(offset);

    if let Some(ref platform) = params.platform {
        let platform: Platform = platform.parse().map_err(|_| {
            error_response(
                StatusCode::BAD_REQUEST,
                format!("Unknown platform: {}", platform),
            )
        })?;
        filter = filter.with_platform(platform);
    }

    if let Some(ref status) = params.status {
        let status = match status.as_str() {
            "active" => ConnectionStatus::Active,
            "disconnected" => ConnectionStatus::Disconnected,
            other => {
                return Err(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Unknown connection status: {}", other),
                ));
            }
        };
        filter = filter.with_connection_status(status);
    }

    if let Some(ref created_by) = params.created_by {
        filter = filter.with_created_by(created_by.clone());
    }

    let channels = state.registry().list(&filter).map_err(map_channel_error)?;

    // Get total count (without pagination)
    let count_filter = ChannelFilter {
        limit: i64::MAX,
        offset: 0,
        ..filter.clone()
    };
    let total = state
        .registry()
        .count(&count_filter)
        .map_err(map_channel_error)?;

    Ok(Json(ListChannelsResponse {
        channels,
        total,
        limit,
        offset,
    }))
}

/// Mark a channel's authorization as lapsed. The channel stays in the
/// registry but can no longer be targeted by publish jobs.
pub async fn disconnect_channel(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Channel>, impl IntoResponse> {
    match state
        .registry()
        .update_connection_status(&id, ConnectionStatus::Disconnected)
    {
        Ok(channel) => {
            metrics::CHANNELS_DISCONNECTED
                .with_label_values(&[channel.platform.as_str()])
                .inc();
            state.audit().try_emit(AuditEvent::ChannelDisconnected {
                user_id,
                channel_id: channel.id.clone(),
                platform: channel.platform.to_string(),
            });

            Ok(Json(channel))
        }
        Err(e) => Err(map_channel_error(e)),
    }
}

/// Restore authorization for a disconnected channel
pub async fn reconnect_channel(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Channel>, impl IntoResponse> {
    match state
        .registry()
        .update_connection_status(&id, ConnectionStatus::Active)
    {
        Ok(channel) => {
            state.audit().try_emit(AuditEvent::ChannelReconnected {
                user_id,
                channel_id: channel.id.clone(),
                platform: channel.platform.to_string(),
            });

            Ok(Json(channel))
        }
        Err(e) => Err(map_channel_error(e)),
    }
}

/// Refresh platform metadata and bump the sync timestamp
pub async fn sync_channel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    body: Option<Json<SyncChannelBody>>,
) -> Result<Json<Channel>, impl IntoResponse> {
    let body = body.map(|Json(b)| b).unwrap_or_default();

    match state
        .registry()
        .touch_sync(&id, body.followers, body.avatar_url)
    {
        Ok(channel) => Ok(Json(channel)),
        Err(e) => Err(map_channel_error(e)),
    }
}

/// Remove a channel from the registry entirely
pub async fn remove_channel(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Channel>, impl IntoResponse> {
    match state.registry().remove(&id) {
        Ok(channel) => {
            metrics::CHANNELS_DISCONNECTED
                .with_label_values(&[channel.platform.as_str()])
                .inc();
            state.audit().try_emit(AuditEvent::ChannelDisconnected {
                user_id,
                channel_id: channel.id.clone(),
                platform: channel.platform.to_string(),
            });

            Ok(Json(channel))
        }
        Err(e) => Err(map_channel_error(e)),
    }
}
