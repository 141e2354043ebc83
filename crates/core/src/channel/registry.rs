use thiserror::Error;

use super::types::{Channel, ConnectionStatus, Platform};

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("channel not found: {0}")]
    NotFound(String),

    #[error("invalid operation on channel {channel_id}: cannot {operation} while {current_status}")]
    InvalidStatus {
        channel_id: String,
        current_status: String,
        operation: String,
    },

    #[error("database error: {0}")]
    Database(String),
}

/// Filter for listing channels.
#[derive(Debug, Clone)]
pub struct ChannelFilter {
    pub platform: Option<Platform>,
    pub connection_status: Option<ConnectionStatus>,
    pub created_by: Option<String>,
    pub limit: i64,
    pub offset: i64,
}

impl Default for ChannelFilter {
    fn default() -> Self {
        Self {
            platform: None,
            connection_status: None,
            created_by: None,
            limit: 100,
            offset: 0,
        }
    }
}

impl ChannelFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn with_connection_status(mut self, status: ConnectionStatus) -> Self {
        self.connection_status = Some(status);
        self
    }

    pub fn with_created_by(mut self, user_id: impl Into<String>) -> Self {
        self.created_by = Some(user_id.into());
        self
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }
}

/// Persistent registry of connected channels.
pub trait ChannelRegistry: Send + Sync {
    /// Stores a newly connected channel.
    fn connect(&self, channel: &Channel) -> Result<(), ChannelError>;

    /// Fetches a channel by id.
    fn get(&self, id: &str) -> Result<Option<Channel>, ChannelError>;

    /// Lists channels matching the filter, newest connection first.
    fn list(&self, filter: &ChannelFilter) -> Result<Vec<Channel>, ChannelError>;

    /// Counts channels matching the filter.
    fn count(&self, filter: &ChannelFilter) -> Result<i64, ChannelError>;

    /// Updates the connection status of a channel.
    ///
    /// Returns `InvalidStatus` when reconnecting a channel that is not
    /// disconnected, so a double reconnect surfaces instead of silently
    /// succeeding.
    fn update_connection_status(
        &self,
        id: &str,
        status: ConnectionStatus,
    ) -> Result<Channel, ChannelError>;

    /// Refreshes mutable platform metadata and bumps `last_synced_at`.
    fn touch_sync(
        &self,
        id: &str,
        followers: Option<u64>,
        avatar_url: Option<String>,
    ) -> Result<Channel, ChannelError>;

    /// Removes a channel entirely, returning the removed row.
    fn remove(&self, id: &str) -> Result<Channel, ChannelError>;
}
