//! Types for channel transport operations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::channel::Platform;
use crate::publish::Asset;

/// Errors a channel transport can report during an upload.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authorization expired for channel {0}")]
    AuthExpired(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Rejected by platform: {0}")]
    Rejected(String),

    #[error("Upload timeout")]
    Timeout,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl TransportError {
    /// Whether an upload that failed with this error is worth retrying.
    /// Authorization and policy failures are permanent until the user
    /// intervenes; transient network failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed(_) | TransportError::Timeout => true,
            TransportError::AuthExpired(_)
            | TransportError::QuotaExceeded(_)
            | TransportError::Rejected(_)
            | TransportError::Internal(_) => false,
        }
    }
}

/// A single upload handed to a transport.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Target channel id.
    pub channel_id: String,
    /// Target platform, for transports that serve more than one.
    pub platform: Platform,
    /// Asset to publish.
    pub asset: Asset,
    /// Post title, shown on platforms that have one.
    pub title: String,
    /// Caption text, hashtags included.
    pub caption: String,
}

/// Confirmation returned by a transport after a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Platform-side post identifier.
    pub post_id: String,
    /// Public URL of the live post, when the platform exposes one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_url: Option<String>,
    /// When the platform accepted the post.
    pub accepted_at: DateTime<Utc>,
}

/// Trait for channel transport backends.
///
/// One transport serves uploads for one or more platforms. Implementations
/// must be safe to call concurrently; the orchestrator fans out one upload
/// per target channel.
#[async_trait]
pub trait PublishTransport: Send + Sync {
    /// Backend name for logging/audit.
    fn name(&self) -> &str;

    /// Upload an asset to a channel and wait for the platform to accept it.
    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, TransportError>;
}
