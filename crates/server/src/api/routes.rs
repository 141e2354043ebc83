use axum::{
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{audit, captions, channels, handlers, middleware, publish, settings};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    let api_routes = Router::new()
        // Health, config, metrics
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::get_metrics))
        // Audit
        .route("/audit", get(audit::query_audit))
        // Channels
        .route("/channels", post(channels::connect_channel))
        .route("/channels", get(channels::list_channels))
        .route("/channels/{id}", get(channels::get_channel))
        .route("/channels/{id}", delete(channels::remove_channel))
        .route("/channels/{id}/disconnect", post(channels::disconnect_channel))
        .route("/channels/{id}/reconnect", post(channels::reconnect_channel))
        .route("/channels/{id}/sync", post(channels::sync_channel))
        .route("/channels/{id}/publish-status", get(publish::get_channel_status))
        // Publish jobs
        .route("/publish", post(publish::submit_job))
        .route("/publish/status", get(publish::get_status))
        .route("/publish/jobs", get(publish::list_jobs))
        .route("/publish/jobs/{id}", get(publish::get_job))
        .route("/publish/jobs/{id}", delete(publish::cancel_job))
        .route("/publish/jobs/{id}/reset", post(publish::reset_job))
        // Captions
        .route("/captions", post(captions::generate_caption))
        // Settings
        .route("/settings", get(settings::get_settings))
        .route("/settings", put(settings::update_settings))
        .route("/settings/detect-provider", post(settings::detect_provider))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            middleware::auth_middleware,
        ))
        .with_state(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .layer(axum_middleware::from_fn(middleware::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
