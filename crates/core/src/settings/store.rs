use thiserror::Error;

use super::{SettingsUpdate, UserSettings};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Persistent per-user settings storage.
pub trait SettingsStore: Send + Sync {
    /// Fetches settings for a user, if they have been initialized.
    fn get(&self, user_id: &str) -> Result<Option<UserSettings>, SettingsError>;

    /// Returns the user's settings, creating the default row on first access.
    fn get_or_init(&self, user_id: &str) -> Result<UserSettings, SettingsError>;

    /// Applies a partial update and returns the merged result. Initializes
    /// defaults first if the user has no row yet.
    fn update(&self, user_id: &str, update: SettingsUpdate) -> Result<UserSettings, SettingsError>;
}
