//! Per-user settings API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use contentflow_core::{AiProvider, AuditEvent, Platform, SettingsUpdate, UserSettings};

use super::middleware::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Settings as returned by the API. Stored API keys are never echoed back;
/// only which providers have one configured.
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub default_platform: Platform,
    pub active_provider: AiProvider,
    pub configured_providers: Vec<AiProvider>,
}

impl From<UserSettings> for SettingsResponse {
    fn from(settings: UserSettings) -> Self {
        let mut configured_providers: Vec<AiProvider> =
            settings.api_keys.keys().copied().collect();
        configured_providers.sort_by_key(|p| p.as_str());

        Self {
            default_platform: settings.default_platform,
            active_provider: settings.active_provider,
            configured_providers,
        }
    }
}

/// Error response
#[derive(Debug, Serialize)]
pub struct SettingsErrorResponse {
    pub error: String,
}

#[derive(Debug, Deserialize)]
pub struct DetectProviderBody {
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct DetectProviderResponse {
    /// None when the key matches no known prefix.
    pub provider: Option<AiProvider>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Get the caller's settings, initializing defaults on first access
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<SettingsResponse>, impl IntoResponse> {
    match state.settings().get_or_init(&user_id) {
        Ok(settings) => Ok(Json(SettingsResponse::from(settings))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SettingsErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}

/// Guess which provider an API key belongs to without storing it
pub async fn detect_provider(
    Json(body): Json<DetectProviderBody>,
) -> Json<DetectProviderResponse> {
    Json(DetectProviderResponse {
        provider: AiProvider::detect_from_key(&body.api_key),
    })
}

/// Apply a partial settings update and return the merged result
pub async fn update_settings(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(update): Json<SettingsUpdate>,
) -> Result<Json<SettingsResponse>, impl IntoResponse> {
    let fields = update.changed_fields();

    match state.settings().update(&user_id, update) {
        Ok(settings) => {
            if !fields.is_empty() {
                state
                    .audit()
                    .try_emit(AuditEvent::SettingsUpdated { user_id, fields });
            }

            Ok(Json(SettingsResponse::from(settings)))
        }
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(SettingsErrorResponse {
                error: e.to_string(),
            }),
        )),
    }
}
