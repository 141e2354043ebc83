//! Mock publish transport for testing.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::transport::{PublishTransport, TransportError, UploadReceipt, UploadRequest};

/// A recorded upload for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedUpload {
    /// The request that was made.
    pub request: UploadRequest,
    /// When the request was made.
    pub timestamp: chrono::DateTime<Utc>,
}

/// Mock implementation of the PublishTransport trait.
///
/// Provides controllable behavior for testing:
/// - Track upload calls for assertions
/// - Queue per-channel failures
/// - Simulate slow platforms
///
/// # Example
///
/// ```rust,ignore
/// let transport = MockTransport::new();
///
/// // First upload to ch-1 times out, the second succeeds
/// transport.fail_next("ch-1", TransportError::Timeout).await;
///
/// orchestrator.submit(request).await?;
///
/// let uploads = transport.uploads().await;
/// assert_eq!(uploads.len(), 2);
/// ```
#[derive(Debug, Default)]
pub struct MockTransport {
    /// Recorded upload calls.
    uploads: Arc<RwLock<Vec<RecordedUpload>>>,
    /// Queued failures by channel id, consumed front-to-back.
    errors: Arc<RwLock<HashMap<String, VecDeque<TransportError>>>>,
    /// Simulated upload latency.
    latency: Arc<RwLock<Duration>>,
}

impl MockTransport {
    /// Create a new mock transport that accepts every upload instantly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded upload calls, in call order.
    pub async fn uploads(&self) -> Vec<RecordedUpload> {
        self.uploads.read().await.clone()
    }

    /// Number of upload calls made for one channel.
    pub async fn upload_count(&self, channel_id: &str) -> usize {
        self.uploads
            .read()
            .await
            .iter()
            .filter(|u| u.request.channel_id == channel_id)
            .count()
    }

    /// Clear recorded upload calls.
    pub async fn clear_recorded(&self) {
        self.uploads.write().await.clear();
    }

    /// Queue an error for the next upload to the given channel. Queued
    /// errors are consumed one per call; once the queue is empty, uploads
    /// to the channel succeed again.
    pub async fn fail_next(&self, channel_id: &str, error: TransportError) {
        self.errors
            .write()
            .await
            .entry(channel_id.to_string())
            .or_default()
            .push_back(error);
    }

    /// Queue the same error `times` times for the given channel.
    pub async fn fail_times(&self, channel_id: &str, error: TransportError, times: usize) {
        let mut errors = self.errors.write().await;
        let queue = errors.entry(channel_id.to_string()).or_default();
        for _ in 0..times {
            queue.push_back(error.clone());
        }
    }

    /// Set a simulated latency applied to every upload.
    pub async fn set_latency(&self, latency: Duration) {
        *self.latency.write().await = latency;
    }
}

#[async_trait]
impl PublishTransport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, TransportError> {
        self.uploads.write().await.push(RecordedUpload {
            request: request.clone(),
            timestamp: Utc::now(),
        });

        let latency = *self.latency.read().await;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        let queued = self
            .errors
            .write()
            .await
            .get_mut(&request.channel_id)
            .and_then(|q| q.pop_front());
        if let Some(error) = queued {
            return Err(error);
        }

        let post_id = format!("mock-{}-{}", request.channel_id, uuid::Uuid::new_v4().simple());
        Ok(UploadReceipt {
            post_url: Some(format!(
                "https://mock.test/{}/{}",
                request.platform.as_str(),
                post_id
            )),
            post_id,
            accepted_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::Platform;
    use crate::publish::Asset;

    fn upload_request(channel_id: &str) -> UploadRequest {
        UploadRequest {
            channel_id: channel_id.to_string(),
            platform: Platform::Tiktok,
            asset: Asset {
                id: "asset-1".to_string(),
                file_name: "clip.mp4".to_string(),
                mime_type: "video/mp4".to_string(),
                size_bytes: 1024,
                duration_secs: Some(15),
            },
            title: "Clip".to_string(),
            caption: "caption".to_string(),
        }
    }

    #[tokio::test]
    async fn test_records_uploads() {
        let transport = MockTransport::new();
        transport.upload(upload_request("ch-1")).await.unwrap();
        transport.upload(upload_request("ch-2")).await.unwrap();

        let uploads = transport.uploads().await;
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].request.channel_id, "ch-1");
        assert_eq!(transport.upload_count("ch-2").await, 1);
    }

    #[tokio::test]
    async fn test_queued_errors_consumed_in_order() {
        let transport = MockTransport::new();
        transport
            .fail_next("ch-1", TransportError::Timeout)
            .await;

        let err = transport.upload(upload_request("ch-1")).await.unwrap_err();
        assert!(matches!(err, TransportError::Timeout));

        // Queue drained, next call succeeds
        assert!(transport.upload(upload_request("ch-1")).await.is_ok());
        // Other channels are unaffected
        assert!(transport.upload(upload_request("ch-2")).await.is_ok());
    }

    #[tokio::test]
    async fn test_fail_times() {
        let transport = MockTransport::new();
        transport
            .fail_times("ch-1", TransportError::ConnectionFailed("reset".to_string()), 2)
            .await;

        assert!(transport.upload(upload_request("ch-1")).await.is_err());
        assert!(transport.upload(upload_request("ch-1")).await.is_err());
        assert!(transport.upload(upload_request("ch-1")).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_latency_applied() {
        let transport = MockTransport::new();
        transport.set_latency(Duration::from_secs(2)).await;

        let start = tokio::time::Instant::now();
        transport.upload(upload_request("ch-1")).await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }
}
