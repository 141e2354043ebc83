//! Publish request, job, and per-channel state machine types.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Broad media category of an asset, derived from its MIME type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Image,
}

/// A media asset selected for publishing.
///
/// The asset is described by metadata only; the service never stores the
/// bytes itself. Uploading hands the reference to the channel transport.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Asset {
    /// Opaque asset identifier.
    pub id: String,

    /// Original file name, e.g. `morning-routine.mp4`.
    pub file_name: String,

    /// MIME type, e.g. `video/mp4` or `image/png`.
    pub mime_type: String,

    /// Size in bytes as reported by the upload.
    pub size_bytes: u64,

    /// Duration for video assets.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
}

impl Asset {
    /// Classifies the asset by MIME prefix. Returns `None` for types the
    /// service cannot publish.
    pub fn kind(&self) -> Option<MediaKind> {
        if self.mime_type.starts_with("video/") {
            Some(MediaKind::Video)
        } else if self.mime_type.starts_with("image/") {
            Some(MediaKind::Image)
        } else {
            None
        }
    }
}

/// When a job should launch.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ScheduleMode {
    /// Launch immediately on submission.
    Now,
    /// Launch at the given instant. Must not be in the past at submission.
    Later { scheduled_for: DateTime<Utc> },
}

/// Per-channel publish state.
///
/// Transitions are strictly monotonic:
/// ```text
/// Ready -> Uploading -> Published
///                    -> Failed
/// ```
/// A channel never skips `Uploading` and never leaves a terminal state
/// except through an explicit job reset, which rebuilds the entry as
/// `Ready`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PublishStatus {
    /// Queued on the job, upload not yet started.
    Ready,

    /// Transport upload in progress.
    Uploading { started_at: DateTime<Utc> },

    /// Upload accepted, post is live.
    Published {
        published_at: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        post_url: Option<String>,
    },

    /// Upload gave up, either immediately or after exhausting retries.
    Failed {
        error: String,
        retryable: bool,
        attempts: u32,
        failed_at: DateTime<Utc>,
    },
}

impl PublishStatus {
    /// Returns true if this status is terminal (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PublishStatus::Published { .. } | PublishStatus::Failed { .. }
        )
    }

    /// Returns a short string label for this status.
    pub fn status_type(&self) -> &'static str {
        match self {
            PublishStatus::Ready => "ready",
            PublishStatus::Uploading { .. } => "uploading",
            PublishStatus::Published { .. } => "published",
            PublishStatus::Failed { .. } => "failed",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            PublishStatus::Ready => 0,
            PublishStatus::Uploading { .. } => 1,
            PublishStatus::Published { .. } | PublishStatus::Failed { .. } => 2,
        }
    }

    /// Whether a transition to `next` respects the monotonic ordering.
    /// Terminal states cannot advance, and `Uploading` cannot be skipped.
    pub fn can_transition_to(&self, next: &PublishStatus) -> bool {
        !self.is_terminal() && next.rank() == self.rank() + 1
    }
}

/// A request to publish one asset to a set of channels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishRequest {
    pub asset: Asset,

    /// Post title, shown on platforms that have one.
    pub title: String,

    /// Caption text, including any hashtags.
    pub caption: String,

    /// Target channel ids. Must be non-empty, and every id must name an
    /// active channel at submission time.
    pub channel_ids: Vec<String>,

    pub schedule: ScheduleMode,

    pub requested_by: String,
}

/// A submitted publish job with its per-channel progress.
///
/// Jobs live in memory for the lifetime of the orchestrator; they are not
/// persisted across restarts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishJob {
    pub id: String,

    pub asset: Asset,

    pub title: String,

    pub caption: String,

    /// Requested schedule, recorded as submitted.
    pub schedule: ScheduleMode,

    pub requested_by: String,

    /// Status per target channel. The key set is exactly the validated
    /// target set and never changes for the life of the job.
    pub per_channel: HashMap<String, PublishStatus>,

    pub created_at: DateTime<Utc>,

    /// Set once the job starts launching uploads (immediately for `Now`,
    /// at the scheduled instant for `Later`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub launched_at: Option<DateTime<Utc>>,

    /// Set when every channel has reached a terminal status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl PublishJob {
    /// Returns the status for a target channel, if the channel is part of
    /// this job.
    pub fn channel_status(&self, channel_id: &str) -> Option<&PublishStatus> {
        self.per_channel.get(channel_id)
    }

    /// True when every channel has reached a terminal status.
    pub fn is_complete(&self) -> bool {
        self.per_channel.values().all(PublishStatus::is_terminal)
    }

    /// True while any channel is still `Ready` or `Uploading`.
    pub fn is_publishing(&self) -> bool {
        !self.is_complete()
    }

    /// Number of channels that published successfully.
    pub fn published_count(&self) -> usize {
        self.per_channel
            .values()
            .filter(|s| matches!(s, PublishStatus::Published { .. }))
            .count()
    }

    /// Number of channels that failed.
    pub fn failed_count(&self) -> usize {
        self.per_channel
            .values()
            .filter(|s| matches!(s, PublishStatus::Failed { .. }))
            .count()
    }
}

/// Rejection reasons for a submitted publish request. A rejected request
/// leaves no state behind: no job is created and no channel is touched.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ValidationError {
    #[error("asset is missing or empty")]
    MissingAsset,

    #[error("unsupported media type: {0}")]
    UnsupportedMediaType(String),

    #[error("no target channels selected")]
    NoTargets,

    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    #[error("channel is disconnected: {0}")]
    ChannelDisconnected(String),

    #[error("scheduled time is required for later scheduling")]
    MissingScheduleTime,

    #[error("scheduled time {scheduled_for} is in the past")]
    ScheduleTimeInPast { scheduled_for: DateTime<Utc> },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video_asset() -> Asset {
        Asset {
            id: "asset-1".to_string(),
            file_name: "morning-routine.mp4".to_string(),
            mime_type: "video/mp4".to_string(),
            size_bytes: 12_582_912,
            duration_secs: Some(42),
        }
    }

    #[test]
    fn test_asset_kind_video() {
        assert_eq!(video_asset().kind(), Some(MediaKind::Video));
    }

    #[test]
    fn test_asset_kind_image() {
        let asset = Asset {
            id: "asset-2".to_string(),
            file_name: "thumbnail.png".to_string(),
            mime_type: "image/png".to_string(),
            size_bytes: 204_800,
            duration_secs: None,
        };
        assert_eq!(asset.kind(), Some(MediaKind::Image));
    }

    #[test]
    fn test_asset_kind_unsupported() {
        let asset = Asset {
            id: "asset-3".to_string(),
            file_name: "notes.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 1024,
            duration_secs: None,
        };
        assert_eq!(asset.kind(), None);
    }

    #[test]
    fn test_schedule_mode_serialization() {
        let json = serde_json::to_string(&ScheduleMode::Now).unwrap();
        assert_eq!(json, r#"{"mode":"now"}"#);

        let later = ScheduleMode::Later {
            scheduled_for: Utc::now(),
        };
        let json = serde_json::to_string(&later).unwrap();
        assert!(json.contains("\"mode\":\"later\""));
        assert!(json.contains("scheduled_for"));

        let parsed: ScheduleMode = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, later);
    }

    #[test]
    fn test_status_is_terminal() {
        assert!(!PublishStatus::Ready.is_terminal());
        assert!(!PublishStatus::Uploading {
            started_at: Utc::now()
        }
        .is_terminal());
        assert!(PublishStatus::Published {
            published_at: Utc::now(),
            post_url: None,
        }
        .is_terminal());
        assert!(PublishStatus::Failed {
            error: "quota exceeded".to_string(),
            retryable: false,
            attempts: 1,
            failed_at: Utc::now(),
        }
        .is_terminal());
    }

    #[test]
    fn test_status_type_labels() {
        assert_eq!(PublishStatus::Ready.status_type(), "ready");
        assert_eq!(
            PublishStatus::Uploading {
                started_at: Utc::now()
            }
            .status_type(),
            "uploading"
        );
    }

    #[test]
    fn test_transitions_are_monotonic() {
        let ready = PublishStatus::Ready;
        let uploading = PublishStatus::Uploading {
            started_at: Utc::now(),
        };
        let published = PublishStatus::Published {
            published_at: Utc::now(),
            post_url: Some("https://tiktok.com/@techdaily/video/1".to_string()),
        };
        let failed = PublishStatus::Failed {
            error: "timeout".to_string(),
            retryable: true,
            attempts: 3,
            failed_at: Utc::now(),
        };

        assert!(ready.can_transition_to(&uploading));
        assert!(uploading.can_transition_to(&published));
        assert!(uploading.can_transition_to(&failed));

        // Uploading cannot be skipped
        assert!(!ready.can_transition_to(&published));
        assert!(!ready.can_transition_to(&failed));

        // Terminal states never advance
        assert!(!published.can_transition_to(&failed));
        assert!(!failed.can_transition_to(&published));
        assert!(!published.can_transition_to(&uploading));
    }

    #[test]
    fn test_status_serialization_tagged() {
        let status = PublishStatus::Failed {
            error: "connection reset".to_string(),
            retryable: true,
            attempts: 2,
            failed_at: Utc::now(),
        };

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"type\":\"failed\""));
        assert!(json.contains("\"retryable\":true"));

        let parsed: PublishStatus = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, status);
    }

    fn job_with_statuses(statuses: Vec<(&str, PublishStatus)>) -> PublishJob {
        PublishJob {
            id: "job-1".to_string(),
            asset: video_asset(),
            title: "Morning Routine".to_string(),
            caption: "New video is up!".to_string(),
            schedule: ScheduleMode::Now,
            requested_by: "test-user".to_string(),
            per_channel: statuses
                .into_iter()
                .map(|(id, s)| (id.to_string(), s))
                .collect(),
            created_at: Utc::now(),
            launched_at: Some(Utc::now()),
            completed_at: None,
        }
    }

    #[test]
    fn test_job_is_publishing_while_any_channel_in_flight() {
        let job = job_with_statuses(vec![
            (
                "ch-1",
                PublishStatus::Published {
                    published_at: Utc::now(),
                    post_url: None,
                },
            ),
            (
                "ch-2",
                PublishStatus::Uploading {
                    started_at: Utc::now(),
                },
            ),
        ]);

        assert!(job.is_publishing());
        assert!(!job.is_complete());
    }

    #[test]
    fn test_job_complete_counts() {
        let job = job_with_statuses(vec![
            (
                "ch-1",
                PublishStatus::Published {
                    published_at: Utc::now(),
                    post_url: None,
                },
            ),
            (
                "ch-2",
                PublishStatus::Failed {
                    error: "rejected by platform".to_string(),
                    retryable: false,
                    attempts: 1,
                    failed_at: Utc::now(),
                },
            ),
        ]);

        assert!(job.is_complete());
        assert!(!job.is_publishing());
        assert_eq!(job.published_count(), 1);
        assert_eq!(job.failed_count(), 1);
    }

    #[test]
    fn test_job_channel_status_unknown_channel() {
        let job = job_with_statuses(vec![("ch-1", PublishStatus::Ready)]);
        assert!(job.channel_status("ch-1").is_some());
        assert!(job.channel_status("ch-9").is_none());
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::UnknownChannel("ch-404".to_string());
        assert_eq!(err.to_string(), "unknown channel: ch-404");

        let err = ValidationError::UnsupportedMediaType("application/zip".to_string());
        assert!(err.to_string().contains("application/zip"));
    }
}
