//! SQLite-backed channel registry implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::{Channel, ChannelError, ChannelFilter, ChannelRegistry, ConnectionStatus, Platform};

const CHANNEL_COLUMNS: &str = "id, platform, display_name, handle, avatar_url, followers, connection_status, created_by, connected_at, last_synced_at";

/// SQLite-backed channel registry.
pub struct SqliteChannelRegistry {
    conn: Mutex<Connection>,
}

impl SqliteChannelRegistry {
    /// Create a new SQLite registry, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, ChannelError> {
        let conn = Connection::open(path).map_err(|e| ChannelError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite registry (useful for testing).
    pub fn in_memory() -> Result<Self, ChannelError> {
        let conn =
            Connection::open_in_memory().map_err(|e| ChannelError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), ChannelError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS channels (
                id TEXT PRIMARY KEY,
                platform TEXT NOT NULL,
                display_name TEXT NOT NULL,
                handle TEXT NOT NULL,
                avatar_url TEXT,
                followers INTEGER,
                connection_status TEXT NOT NULL,
                created_by TEXT NOT NULL,
                connected_at TEXT NOT NULL,
                last_synced_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_channels_platform ON channels(platform);
            CREATE INDEX IF NOT EXISTS idx_channels_created_by ON channels(created_by);
            CREATE INDEX IF NOT EXISTS idx_channels_status ON channels(connection_status);
            "#,
        )
        .map_err(|e| ChannelError::Database(e.to_string()))?;

        Ok(())
    }

    fn build_where_clause(filter: &ChannelFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(platform) = filter.platform {
            conditions.push("platform = ?");
            params.push(Box::new(platform.as_str()));
        }

        if let Some(status) = filter.connection_status {
            conditions.push("connection_status = ?");
            params.push(Box::new(status.as_str()));
        }

        if let Some(ref created_by) = filter.created_by {
            conditions.push("created_by = ?");
            params.push(Box::new(created_by.clone()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_channel(row: &rusqlite::Row) -> rusqlite::Result<Channel> {
        let id: String = row.get(0)?;
        let platform_str: String = row.get(1)?;
        let display_name: String = row.get(2)?;
        let handle: String = row.get(3)?;
        let avatar_url: Option<String> = row.get(4)?;
        let followers: Option<u64> = row.get(5)?;
        let status_str: String = row.get(6)?;
        let created_by: String = row.get(7)?;
        let connected_at_str: String = row.get(8)?;
        let last_synced_at_str: String = row.get(9)?;

        let platform: Platform = platform_str.parse().unwrap_or(Platform::Youtube);

        let connection_status = match status_str.as_str() {
            "disconnected" => ConnectionStatus::Disconnected,
            _ => ConnectionStatus::Active,
        };

        let connected_at = DateTime::parse_from_rfc3339(&connected_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        let last_synced_at = DateTime::parse_from_rfc3339(&last_synced_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Channel {
            id,
            platform,
            display_name,
            handle,
            avatar_url,
            followers,
            connection_status,
            created_by,
            connected_at,
            last_synced_at,
        })
    }

    fn fetch(conn: &Connection, id: &str) -> Result<Channel, ChannelError> {
        let result = conn.query_row(
            &format!("SELECT {} FROM channels WHERE id = ?", CHANNEL_COLUMNS),
            params![id],
            Self::row_to_channel,
        );

        match result {
            Ok(channel) => Ok(channel),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(ChannelError::NotFound(id.to_string())),
            Err(e) => Err(ChannelError::Database(e.to_string())),
        }
    }
}

impl ChannelRegistry for SqliteChannelRegistry {
    fn connect(&self, channel: &Channel) -> Result<(), ChannelError> {
        let conn = self.conn.lock().unwrap();

        conn.execute(
            &format!(
                "INSERT OR REPLACE INTO channels ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                CHANNEL_COLUMNS
            ),
            params![
                channel.id,
                channel.platform.as_str(),
                channel.display_name,
                channel.handle,
                channel.avatar_url,
                channel.followers,
                channel.connection_status.as_str(),
                channel.created_by,
                channel.connected_at.to_rfc3339(),
                channel.last_synced_at.to_rfc3339(),
            ],
        )
        .map_err(|e| ChannelError::Database(e.to_string()))?;

        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<Channel>, ChannelError> {
        let conn = self.conn.lock().unwrap();

        match Self::fetch(&conn, id) {
            Ok(channel) => Ok(Some(channel)),
            Err(ChannelError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn list(&self, filter: &ChannelFilter) -> Result<Vec<Channel>, ChannelError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM channels {} ORDER BY connected_at DESC LIMIT ? OFFSET ?",
            CHANNEL_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ChannelError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_channel)
            .map_err(|e| ChannelError::Database(e.to_string()))?;

        let mut channels = Vec::new();
        for row_result in rows {
            let channel = row_result.map_err(|e| ChannelError::Database(e.to_string()))?;
            channels.push(channel);
        }

        Ok(channels)
    }

    fn count(&self, filter: &ChannelFilter) -> Result<i64, ChannelError> {
        let conn = self.conn.lock().unwrap();

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM channels {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| ChannelError::Database(e.to_string()))?;

        Ok(count)
    }

    fn update_connection_status(
        &self,
        id: &str,
        status: ConnectionStatus,
    ) -> Result<Channel, ChannelError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::fetch(&conn, id)?;

        if current.connection_status == status {
            let operation = match status {
                ConnectionStatus::Active => "reconnect",
                ConnectionStatus::Disconnected => "mark disconnected",
            };
            return Err(ChannelError::InvalidStatus {
                channel_id: id.to_string(),
                current_status: current.connection_status.as_str().to_string(),
                operation: operation.to_string(),
            });
        }

        let now = Utc::now();
        conn.execute(
            "UPDATE channels SET connection_status = ?, last_synced_at = ? WHERE id = ?",
            params![status.as_str(), now.to_rfc3339(), id],
        )
        .map_err(|e| ChannelError::Database(e.to_string()))?;

        Ok(Channel {
            connection_status: status,
            last_synced_at: now,
            ..current
        })
    }

    fn touch_sync(
        &self,
        id: &str,
        followers: Option<u64>,
        avatar_url: Option<String>,
    ) -> Result<Channel, ChannelError> {
        let conn = self.conn.lock().unwrap();

        let current = Self::fetch(&conn, id)?;

        let followers = followers.or(current.followers);
        let avatar_url = avatar_url.or_else(|| current.avatar_url.clone());

        let now = Utc::now();
        conn.execute(
            "UPDATE channels SET followers = ?, avatar_url = ?, last_synced_at = ? WHERE id = ?",
            params![followers, avatar_url, now.to_rfc3339(), id],
        )
        .map_err(|e| ChannelError::Database(e.to_string()))?;

        Ok(Channel {
            followers,
            avatar_url,
            last_synced_at: now,
            ..current
        })
    }

    fn remove(&self, id: &str) -> Result<Channel, ChannelError> {
        let conn = self.conn.lock().unwrap();

        let channel = Self::fetch(&conn, id)?;

        conn.execute("DELETE FROM channels WHERE id = ?", params![id])
            .map_err(|e| ChannelError::Database(e.to_string()))?;

        Ok(channel)
    }
}
