//! Per-user settings for caption providers and publishing defaults.

mod sqlite;
mod store;
mod types;

pub use sqlite::SqliteSettingsStore;
pub use store::{SettingsError, SettingsStore};
pub use types::{AiProvider, SettingsUpdate, UserSettings};
