use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Audit event types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuditEvent {
    // System events
    ServiceStarted {
        version: String,
        config_hash: String,
    },
    ServiceStopped {
        reason: String,
    },

    // Channel lifecycle
    ChannelConnected {
        /// Who connected the channel
        user_id: String,
        channel_id: String,
        platform: String,
        handle: String,
    },
    ChannelDisconnected {
        /// Who removed the channel
        user_id: String,
        channel_id: String,
        platform: String,
    },
    ChannelReconnected {
        /// Who restored the authorization
        user_id: String,
        channel_id: String,
        platform: String,
    },

    // Publish job lifecycle
    JobSubmitted {
        job_id: String,
        requested_by: String,
        asset_name: String,
        channel_count: usize,
        /// "now" or "later"
        schedule: String,
    },
    JobScheduled {
        job_id: String,
        scheduled_for: DateTime<Utc>,
        delay_secs: i64,
    },
    PublishStateChanged {
        job_id: String,
        channel_id: String,
        from_status: String,
        to_status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    JobCompleted {
        job_id: String,
        published: usize,
        failed: usize,
        duration_ms: u64,
    },
    JobCancelled {
        job_id: String,
        cancelled_by: String,
        /// Channels still in flight when the cancel landed
        channels_cancelled: usize,
    },
    JobReset {
        job_id: String,
        reset_by: String,
        channels_reset: usize,
    },

    // Caption generation
    CaptionGenerated {
        /// Who requested the caption
        user_id: String,
        provider: String,
        model: String,
        topic: String,
        caption_chars: usize,
        duration_ms: u64,
    },
    CaptionFailed {
        /// Who requested the caption
        user_id: String,
        provider: String,
        error: String,
        duration_ms: u64,
        is_timeout: bool,
    },

    // Settings
    SettingsUpdated {
        user_id: String,
        /// Field names that changed, never values
        fields: Vec<String>,
    },
}

impl AuditEvent {
    /// Returns the event type as a string for storage
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::ServiceStarted { .. } => "service_started",
            Self::ServiceStopped { .. } => "service_stopped",
            Self::ChannelConnected { .. } => "channel_connected",
            Self::ChannelDisconnected { .. } => "channel_disconnected",
            Self::ChannelReconnected { .. } => "channel_reconnected",
            Self::JobSubmitted { .. } => "job_submitted",
            Self::JobScheduled { .. } => "job_scheduled",
            Self::PublishStateChanged { .. } => "publish_state_changed",
            Self::JobCompleted { .. } => "job_completed",
            Self::JobCancelled { .. } => "job_cancelled",
            Self::JobReset { .. } => "job_reset",
            Self::CaptionGenerated { .. } => "caption_generated",
            Self::CaptionFailed { .. } => "caption_failed",
            Self::SettingsUpdated { .. } => "settings_updated",
        }
    }

    /// Extract job_id if this event is job-related
    pub fn job_id(&self) -> Option<&str> {
        match self {
            Self::JobSubmitted { job_id, .. }
            | Self::JobScheduled { job_id, .. }
            | Self::PublishStateChanged { job_id, .. }
            | Self::JobCompleted { job_id, .. }
            | Self::JobCancelled { job_id, .. }
            | Self::JobReset { job_id, .. } => Some(job_id),
            _ => None,
        }
    }

    /// Extract user_id if this event was triggered by a user action
    pub fn user_id(&self) -> Option<&str> {
        match self {
            Self::JobSubmitted { requested_by, .. } => Some(requested_by),
            Self::JobCancelled { cancelled_by, .. } => Some(cancelled_by),
            Self::JobReset { reset_by, .. } => Some(reset_by),
            Self::ChannelConnected { user_id, .. }
            | Self::ChannelDisconnected { user_id, .. }
            | Self::ChannelReconnected { user_id, .. }
            | Self::CaptionGenerated { user_id, .. }
            | Self::CaptionFailed { user_id, .. }
            | Self::SettingsUpdated { user_id, .. } => Some(user_id),
            _ => None,
        }
    }
}

/// A stored audit record with metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub id: i64,
    pub timestamp: DateTime<Utc>,
    pub event_type: String,
    pub job_id: Option<String>,
    pub user_id: Option<String>,
    pub data: AuditEvent,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_service_started() {
        let event = AuditEvent::ServiceStarted {
            version: "0.1.0".to_string(),
            config_hash: "abc123".to_string(),
        };
        assert_eq!(event.event_type(), "service_started");
        assert_eq!(event.job_id(), None);
        assert_eq!(event.user_id(), None);
    }

    #[test]
    fn test_event_type_channel_connected() {
        let event = AuditEvent::ChannelConnected {
            user_id: "user-456".to_string(),
            channel_id: "ch-123".to_string(),
            platform: "tiktok".to_string(),
            handle: "@techdaily".to_string(),
        };
        assert_eq!(event.event_type(), "channel_connected");
        assert_eq!(event.job_id(), None);
        assert_eq!(event.user_id(), Some("user-456"));
    }

    #[test]
    fn test_event_type_job_submitted() {
        let event = AuditEvent::JobSubmitted {
            job_id: "job-123".to_string(),
            requested_by: "user-456".to_string(),
            asset_name: "clip.mp4".to_string(),
            channel_count: 3,
            schedule: "now".to_string(),
        };
        assert_eq!(event.event_type(), "job_submitted");
        assert_eq!(event.job_id(), Some("job-123"));
        assert_eq!(event.user_id(), Some("user-456"));
    }

    #[test]
    fn test_event_type_publish_state_changed() {
        let event = AuditEvent::PublishStateChanged {
            job_id: "job-123".to_string(),
            channel_id: "ch-1".to_string(),
            from_status: "ready".to_string(),
            to_status: "uploading".to_string(),
            error: None,
        };
        assert_eq!(event.event_type(), "publish_state_changed");
        assert_eq!(event.job_id(), Some("job-123"));
        assert_eq!(event.user_id(), None);
    }

    #[test]
    fn test_event_type_job_cancelled() {
        let event = AuditEvent::JobCancelled {
            job_id: "job-123".to_string(),
            cancelled_by: "admin".to_string(),
            channels_cancelled: 2,
        };
        assert_eq!(event.event_type(), "job_cancelled");
        assert_eq!(event.job_id(), Some("job-123"));
        assert_eq!(event.user_id(), Some("admin"));
    }

    #[test]
    fn test_serialize_deserialize_state_changed() {
        let event = AuditEvent::PublishStateChanged {
            job_id: "job-1".to_string(),
            channel_id: "ch-1".to_string(),
            from_status: "uploading".to_string(),
            to_status: "failed".to_string(),
            error: Some("quota exceeded".to_string()),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"publish_state_changed\""));
        assert!(json.contains("\"error\":\"quota exceeded\""));

        let deserialized: AuditEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.event_type(), "publish_state_changed");
        assert_eq!(deserialized.job_id(), Some("job-1"));
    }

    #[test]
    fn test_serialize_state_changed_no_error_skipped() {
        let event = AuditEvent::PublishStateChanged {
            job_id: "job-1".to_string(),
            channel_id: "ch-1".to_string(),
            from_status: "ready".to_string(),
            to_status: "uploading".to_string(),
            error: None,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("error"));
    }

    #[test]
    fn test_event_type_caption_generated() {
        let event = AuditEvent::CaptionGenerated {
            user_id: "user-1".to_string(),
            provider: "google".to_string(),
            model: "gemini-2.5-flash".to_string(),
            topic: "morning routine tips".to_string(),
            caption_chars: 240,
            duration_ms: 850,
        };
        assert_eq!(event.event_type(), "caption_generated");
        assert_eq!(event.user_id(), Some("user-1"));
    }

    #[test]
    fn test_event_type_settings_updated() {
        let event = AuditEvent::SettingsUpdated {
            user_id: "user-1".to_string(),
            fields: vec!["default_platform".to_string()],
        };
        assert_eq!(event.event_type(), "settings_updated");
        assert_eq!(event.user_id(), Some("user-1"));
        assert_eq!(event.job_id(), None);
    }

    #[test]
    fn test_audit_record_serialize() {
        let record = AuditRecord {
            id: 1,
            timestamp: Utc::now(),
            event_type: "service_started".to_string(),
            job_id: None,
            user_id: None,
            data: AuditEvent::ServiceStarted {
                version: "0.1.0".to_string(),
                config_hash: "abc123".to_string(),
            },
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"id\":1"));
        assert!(json.contains("\"event_type\":\"service_started\""));
    }
}
