//! Testing utilities and mock implementations for E2E tests.
//!
//! This module provides mock implementations of the external service traits,
//! allowing comprehensive E2E testing without real platform credentials.
//!
//! # Example
//!
//! ```rust,ignore
//! use contentflow_core::testing::{fixtures, MockTransport};
//!
//! let transport = MockTransport::new();
//! transport.fail_next("ch-1", TransportError::Timeout).await;
//!
//! let channel = fixtures::active_channel("ch-1", Platform::Tiktok);
//! // Use in AppState...
//! ```

mod mock_transport;

pub use mock_transport::{MockTransport, RecordedUpload};

/// Test fixtures and helper functions.
pub mod fixtures {
    use chrono::Utc;

    use crate::channel::{Channel, ConnectionStatus, Platform};
    use crate::publish::{Asset, PublishRequest, ScheduleMode};

    /// Create a connected channel with reasonable defaults.
    pub fn active_channel(id: &str, platform: Platform) -> Channel {
        Channel {
            id: id.to_string(),
            platform,
            display_name: format!("Test {}", platform.label()),
            handle: format!("@test_{}", platform.as_str()),
            avatar_url: None,
            followers: Some(12_500),
            connection_status: ConnectionStatus::Active,
            created_by: "test-user".to_string(),
            connected_at: Utc::now(),
            last_synced_at: Utc::now(),
        }
    }

    /// Create a channel whose platform authorization has lapsed.
    pub fn disconnected_channel(id: &str, platform: Platform) -> Channel {
        Channel {
            connection_status: ConnectionStatus::Disconnected,
            ..active_channel(id, platform)
        }
    }

    /// Create a test video asset.
    pub fn video_asset(file_name: &str) -> Asset {
        Asset {
            id: format!("asset-{}", file_name.replace('.', "-")),
            file_name: file_name.to_string(),
            mime_type: "video/mp4".to_string(),
            size_bytes: 24 * 1024 * 1024,
            duration_secs: Some(42),
        }
    }

    /// Create a test image asset.
    pub fn image_asset(file_name: &str) -> Asset {
        Asset {
            id: format!("asset-{}", file_name.replace('.', "-")),
            file_name: file_name.to_string(),
            mime_type: "image/png".to_string(),
            size_bytes: 512 * 1024,
            duration_secs: None,
        }
    }

    /// Create an immediate publish request targeting the given channels.
    pub fn publish_request(channel_ids: &[&str]) -> PublishRequest {
        PublishRequest {
            asset: video_asset("morning-routine.mp4"),
            title: "Morning Routine".to_string(),
            caption: "New video is up! #fyp #daily".to_string(),
            channel_ids: channel_ids.iter().map(|s| s.to_string()).collect(),
            schedule: ScheduleMode::Now,
            requested_by: "test-user".to_string(),
        }
    }
}
