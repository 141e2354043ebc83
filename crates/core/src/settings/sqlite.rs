//! SQLite-backed settings store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use super::{SettingsError, SettingsStore, SettingsUpdate, UserSettings};

/// SQLite-backed settings store. One row per user, settings stored as JSON.
pub struct SqliteSettingsStore {
    conn: Mutex<Connection>,
}

impl SqliteSettingsStore {
    /// Create a new SQLite settings store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, SettingsError> {
        let conn = Connection::open(path).map_err(|e| SettingsError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite settings store (useful for testing).
    pub fn in_memory() -> Result<Self, SettingsError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SettingsError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), SettingsError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS user_settings (
                user_id TEXT PRIMARY KEY,
                settings TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| SettingsError::Database(e.to_string()))?;

        Ok(())
    }

    fn read_row(conn: &Connection, user_id: &str) -> Result<Option<UserSettings>, SettingsError> {
        let result = conn.query_row(
            "SELECT settings FROM user_settings WHERE user_id = ?",
            params![user_id],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(json) => {
                let settings = serde_json::from_str(&json)
                    .map_err(|e| SettingsError::Serialization(e.to_string()))?;
                Ok(Some(settings))
            }
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(SettingsError::Database(e.to_string())),
        }
    }

    fn write_row(
        conn: &Connection,
        user_id: &str,
        settings: &UserSettings,
    ) -> Result<(), SettingsError> {
        let json = serde_json::to_string(settings)
            .map_err(|e| SettingsError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO user_settings (user_id, settings, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET settings = excluded.settings, updated_at = excluded.updated_at",
            params![user_id, json, Utc::now().to_rfc3339()],
        )
        .map_err(|e| SettingsError::Database(e.to_string()))?;

        Ok(())
    }
}

impl SettingsStore for SqliteSettingsStore {
    fn get(&self, user_id: &str) -> Result<Option<UserSettings>, SettingsError> {
        let conn = self.conn.lock().unwrap();
        Self::read_row(&conn, user_id)
    }

    fn get_or_init(&self, user_id: &str) -> Result<UserSettings, SettingsError> {
        let conn = self.conn.lock().unwrap();

        if let Some(settings) = Self::read_row(&conn, user_id)? {
            return Ok(settings);
        }

        let defaults = UserSettings::default();
        Self::write_row(&conn, user_id, &defaults)?;
        Ok(defaults)
    }

    fn update(&self, user_id: &str, update: SettingsUpdate) -> Result<UserSettings, SettingsError> {
        let conn = self.conn.lock().unwrap();

        let mut settings = Self::read_row(&conn, user_id)?.unwrap_or_default();
        settings.apply(update);
        Self::write_row(&conn, user_id, &settings)?;

        Ok(settings)
    }
}
