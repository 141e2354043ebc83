//! Simulated transport for platforms without a live integration.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use super::{PublishTransport, TransportError, UploadRequest, UploadReceipt};
use crate::channel::Platform;

/// Transport that accepts every upload after a fixed latency.
///
/// Stands in for real platform integrations: uploads always succeed and
/// return a fabricated post URL shaped like the platform's real ones.
pub struct SimulatedTransport {
    latency: Duration,
}

impl SimulatedTransport {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    fn fabricate_post_url(platform: Platform, post_id: &str) -> String {
        match platform {
            Platform::Youtube => format!("https://youtube.com/shorts/{}", post_id),
            Platform::Tiktok => format!("https://tiktok.com/video/{}", post_id),
            Platform::Instagram => format!("https://instagram.com/reel/{}", post_id),
            Platform::Facebook => format!("https://facebook.com/reel/{}", post_id),
            Platform::Linkedin => format!("https://linkedin.com/feed/update/{}", post_id),
            Platform::Twitter => format!("https://x.com/i/status/{}", post_id),
            Platform::Pinterest => format!("https://pinterest.com/pin/{}", post_id),
            Platform::Snapchat => format!("https://snapchat.com/spotlight/{}", post_id),
            Platform::Twitch => format!("https://twitch.tv/videos/{}", post_id),
        }
    }
}

#[async_trait]
impl PublishTransport for SimulatedTransport {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt, TransportError> {
        tokio::time::sleep(self.latency).await;

        let post_id = uuid::Uuid::new_v4().simple().to_string();
        let post_url = Self::fabricate_post_url(request.platform, &post_id);

        tracing::debug!(
            channel_id = %request.channel_id,
            platform = %request.platform,
            asset = %request.asset.file_name,
            %post_id,
            "simulated upload accepted"
        );

        Ok(UploadReceipt {
            post_id,
            post_url: Some(post_url),
            accepted_at: Utc::now(),
        })
    }
}
