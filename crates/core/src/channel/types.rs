//! Core channel data types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A destination social platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Youtube,
    Tiktok,
    Instagram,
    Facebook,
    Linkedin,
    Twitter,
    Pinterest,
    Snapchat,
    Twitch,
}

impl Platform {
    /// Returns the platform as a lowercase identifier (for filtering/URLs).
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Facebook => "facebook",
            Platform::Linkedin => "linkedin",
            Platform::Twitter => "twitter",
            Platform::Pinterest => "pinterest",
            Platform::Snapchat => "snapchat",
            Platform::Twitch => "twitch",
        }
    }

    /// Human-readable display label.
    pub fn label(&self) -> &'static str {
        match self {
            Platform::Youtube => "YouTube",
            Platform::Tiktok => "TikTok",
            Platform::Instagram => "Instagram",
            Platform::Facebook => "Facebook",
            Platform::Linkedin => "LinkedIn",
            Platform::Twitter => "X (Twitter)",
            Platform::Pinterest => "Pinterest",
            Platform::Snapchat => "Snapchat",
            Platform::Twitch => "Twitch",
        }
    }

    /// All known platforms, in display order.
    pub fn all() -> &'static [Platform] {
        &[
            Platform::Youtube,
            Platform::Tiktok,
            Platform::Instagram,
            Platform::Facebook,
            Platform::Linkedin,
            Platform::Twitter,
            Platform::Pinterest,
            Platform::Snapchat,
            Platform::Twitch,
        ]
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "youtube" => Ok(Platform::Youtube),
            "tiktok" => Ok(Platform::Tiktok),
            "instagram" => Ok(Platform::Instagram),
            "facebook" => Ok(Platform::Facebook),
            "linkedin" => Ok(Platform::Linkedin),
            "twitter" | "x" => Ok(Platform::Twitter),
            "pinterest" => Ok(Platform::Pinterest),
            "snapchat" => Ok(Platform::Snapchat),
            "twitch" => Ok(Platform::Twitch),
            other => Err(format!("unknown platform: {}", other)),
        }
    }
}

/// Connection state of a channel.
///
/// State machine:
/// ```text
/// (external OAuth grant / simulated connect) --> Active
/// Active --disconnect--> removed
/// Disconnected --reconnect--> Active
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Channel is connected and eligible to receive publishes.
    Active,
    /// Authorization lapsed; must be reconnected before targeting.
    Disconnected,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Active => "active",
            ConnectionStatus::Disconnected => "disconnected",
        }
    }
}

/// A connected destination account.
///
/// Created when the external identity provider completes an authorization
/// grant (or a simulated connect for platforms without a real integration),
/// removed on explicit user disconnect. Owned by the creating user session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Channel {
    /// Opaque stable identifier (UUID).
    pub id: String,

    /// Destination platform.
    pub platform: Platform,

    /// Display name of the account (e.g. "Tech Daily Shorts").
    pub display_name: String,

    /// Platform handle (e.g. "@techdaily").
    pub handle: String,

    /// Avatar URL from the identity provider, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,

    /// Follower count as last reported by the platform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub followers: Option<u64>,

    /// Current connection state.
    pub connection_status: ConnectionStatus,

    /// User who connected the channel.
    pub created_by: String,

    /// When the channel was first connected.
    pub connected_at: DateTime<Utc>,

    /// When channel metadata was last refreshed.
    pub last_synced_at: DateTime<Utc>,
}

impl Channel {
    /// Returns true if the channel can be targeted by a publish job.
    pub fn is_publishable(&self) -> bool {
        self.connection_status == ConnectionStatus::Active
    }
}
