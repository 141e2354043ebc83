//! Caption generation API handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use contentflow_core::{
    build_client, metrics, AuditEvent, CaptionGenerator, CaptionRequest, CaptionerConfig,
    CaptionerSection, LlmClient, LlmError, LlmUsage, OllamaClient, Platform, UserSettings,
};

use super::middleware::AuthUser;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for generating a caption
#[derive(Debug, Deserialize)]
pub struct GenerateCaptionBody {
    /// What the post is about
    pub topic: String,
    /// Target platform; defaults to the user's default platform
    pub platform: Option<Platform>,
    /// Optional tone hint, e.g. "playful"
    pub tone: Option<String>,
}

/// Response for a generated caption
#[derive(Debug, Serialize)]
pub struct GenerateCaptionResponse {
    pub caption: String,
    pub provider: String,
    pub model: String,
    pub usage: LlmUsage,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct CaptionErrorResponse {
    pub error: String,
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
) -> (StatusCode, Json<CaptionErrorResponse>) {
    (
        status,
        Json(CaptionErrorResponse {
            error: error.into(),
        }),
    )
}

/// Picks the LLM client for a caption request. The user's active provider
/// and stored key win; with no stored key, a configured local Ollama server
/// is preferred over the service-level keyed fallback.
fn resolve_client(
    settings: &UserSettings,
    config: &CaptionerSection,
) -> Result<Arc<dyn LlmClient>, LlmError> {
    if let Some(key) = settings.active_api_key() {
        return build_client(settings.active_provider, key, &config.model);
    }
    if let Some(ref base) = config.ollama_api_base {
        return Ok(Arc::new(OllamaClient::new(&config.model).with_api_base(base)));
    }
    match config.api_key {
        Some(ref key) if !key.is_empty() => build_client(config.provider, key, &config.model),
        _ => Err(LlmError::NotConfigured),
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// Generate a caption for a topic.
///
/// Provider and API key resolution: the user's stored settings win; the
/// service-level captioner config is the fallback. A request with no usable
/// key anywhere is rejected up front, before any provider call.
pub async fn generate_caption(
    State(state): State<Arc<AppState>>,
    AuthUser(user_id): AuthUser,
    Json(body): Json<GenerateCaptionBody>,
) -> Result<Json<GenerateCaptionResponse>, impl IntoResponse> {
    let captioner_config = &state.config().captioner;

    let user_settings = state
        .settings()
        .get_or_init(&user_id)
        .map_err(|e| error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let client = match resolve_client(&user_settings, captioner_config) {
        Ok(client) => client,
        Err(LlmError::NotConfigured) => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                "no API key configured for caption generation",
            ));
        }
        Err(e) => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("caption provider unavailable: {}", e),
            ));
        }
    };
    let provider_label = client.provider().to_string();

    let generator = CaptionGenerator::new(
        client,
        CaptionerConfig {
            max_attempts: captioner_config.max_attempts,
            retry_backoff_ms: captioner_config.retry_backoff_ms,
            timeout_secs: captioner_config.timeout_secs,
            max_tokens: captioner_config.max_tokens,
        },
    );

    let request = CaptionRequest {
        topic: body.topic.clone(),
        platform: body.platform.unwrap_or(user_settings.default_platform),
        tone: body.tone,
    };

    let start = Instant::now();
    match generator.generate(&request).await {
        Ok(caption) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            metrics::CAPTION_REQUESTS
                .with_label_values(&[&caption.provider, "ok"])
                .inc();
            metrics::CAPTION_DURATION
                .with_label_values(&[&caption.provider])
                .observe(start.elapsed().as_secs_f64());
            metrics::LLM_TOKENS
                .with_label_values(&[&caption.provider, "input"])
                .inc_by(caption.usage.input_tokens as u64);
            metrics::LLM_TOKENS
                .with_label_values(&[&caption.provider, "output"])
                .inc_by(caption.usage.output_tokens as u64);

            state.audit().try_emit(AuditEvent::CaptionGenerated {
                user_id,
                provider: caption.provider.clone(),
                model: caption.model.clone(),
                topic: body.topic,
                caption_chars: caption.text.chars().count(),
                duration_ms,
            });

            Ok(Json(GenerateCaptionResponse {
                caption: caption.text,
                provider: caption.provider,
                model: caption.model,
                usage: caption.usage,
            }))
        }
        Err(e) => {
            let duration_ms = start.elapsed().as_millis() as u64;
            let is_timeout = matches!(e, LlmError::Timeout(_));
            metrics::CAPTION_REQUESTS
                .with_label_values(&[&provider_label, "error"])
                .inc();

            state.audit().try_emit(AuditEvent::CaptionFailed {
                user_id,
                provider: provider_label,
                error: e.to_string(),
                duration_ms,
                is_timeout,
            });

            let status = if is_timeout {
                StatusCode::GATEWAY_TIMEOUT
            } else {
                StatusCode::BAD_GATEWAY
            };
            Err(error_response(status, e.to_string()))
        }
    }
}
