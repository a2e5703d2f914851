//! Persistent SQLite store for users and mood entries.

use crate::mood::{MoodEntry, MoodValue};
use chrono::{DateTime, Utc};
use rusqlite::{Connection, params};
use std::path::Path;
use std::sync::Mutex;
use tracing::{info, warn};

/// Format for every stored timestamp (UTC). Lexicographic order matches
/// chronological order, so range scans compare the text directly.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A registered user.
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: i64,
    pub username: Option<String>,
    #[allow(dead_code)]
    pub created_at: String,
}

impl User {
    /// Handle for log lines: `@username` when known, the id otherwise.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(name) => format!("@{name}"),
            None => self.user_id.to_string(),
        }
    }
}

/// Persistent SQLite store for the bot.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the store at the given path.
    pub fn open(path: &Path) -> Result<Self, String> {
        let conn = Connection::open(path).map_err(|e| format!("Failed to open database: {e}"))?;
        let store = Self { conn: Mutex::new(conn) };
        store.init_schema()?;

        let (user_count, entry_count) = store.get_counts();
        info!(
            "Opened store at {:?} ({} users, {} mood entries)",
            path, user_count, entry_count
        );

        Ok(store)
    }

    /// In-memory store for tests.
    #[cfg(test)]
    pub fn in_memory() -> Self {
        let conn = Connection::open_in_memory().expect("Failed to create in-memory database");
        let store = Self { conn: Mutex::new(conn) };
        store.init_schema().expect("Failed to initialize schema");
        store
    }

    fn init_schema(&self) -> Result<(), String> {
        let conn = self.conn.lock().unwrap();

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                user_id INTEGER PRIMARY KEY,
                username TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS moods (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                score INTEGER,
                mood TEXT,
                timestamp TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_moods_user_id ON moods(user_id);
            CREATE INDEX IF NOT EXISTS idx_moods_timestamp ON moods(timestamp);
        "#,
        )
        .map_err(|e| format!("Failed to initialize schema: {e}"))
    }

    fn get_counts(&self) -> (usize, usize) {
        let conn = self.conn.lock().unwrap();
        let users: i64 = conn
            .query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
            .unwrap_or(0);
        let entries: i64 = conn
            .query_row("SELECT COUNT(*) FROM moods", [], |row| row.get(0))
            .unwrap_or(0);
        (users as usize, entries as usize)
    }

    /// Register a user. Registering an already-known id is a successful
    /// no-op and leaves exactly one row.
    pub fn create_user(&self, user_id: i64, username: Option<&str>) -> Result<(), String> {
        let created_at = Utc::now().format(TIMESTAMP_FORMAT).to_string();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR IGNORE INTO users (user_id, username, created_at) VALUES (?1, ?2, ?3)",
            params![user_id, username, created_at],
        )
        .map_err(|e| format!("Failed to create user: {e}"))?;
        Ok(())
    }

    /// Look up a user by platform id.
    pub fn get_user(&self, user_id: i64) -> Option<User> {
        let conn = self.conn.lock().unwrap();
        conn.query_row(
            "SELECT user_id, username, created_at FROM users WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(User {
                    user_id: row.get(0)?,
                    username: row.get(1)?,
                    created_at: row.get(2)?,
                })
            },
        )
        .ok()
    }

    /// All registered users, for the broadcast cycle.
    pub fn list_users(&self) -> Result<Vec<User>, String> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT user_id, username, created_at FROM users ORDER BY user_id")
            .map_err(|e| format!("Failed to prepare user query: {e}"))?;

        let rows = stmt
            .query_map([], |row| {
                Ok(User {
                    user_id: row.get(0)?,
                    username: row.get(1)?,
                    created_at: row.get(2)?,
                })
            })
            .map_err(|e| format!("Failed to list users: {e}"))?;

        let mut users = Vec::new();
        for row in rows {
            match row {
                Ok(user) => users.push(user),
                Err(e) => warn!("Skipping unreadable user row: {e}"),
            }
        }
        Ok(users)
    }

    /// Record a mood entry stamped with the current time.
    pub fn save_entry(&self, user_id: i64, value: &MoodValue) -> Result<(), String> {
        self.save_entry_at(user_id, value, Utc::now())
    }

    /// Record a mood entry with an explicit timestamp. Every value shape is
    /// accepted at write time; decoding happens on read.
    pub fn save_entry_at(
        &self,
        user_id: i64,
        value: &MoodValue,
        timestamp: DateTime<Utc>,
    ) -> Result<(), String> {
        let (score, label) = value.to_fields();
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT INTO moods (user_id, score, mood, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                user_id,
                score,
                label,
                timestamp.format(TIMESTAMP_FORMAT).to_string()
            ],
        )
        .map_err(|e| format!("Failed to save mood entry: {e}"))?;
        Ok(())
    }

    /// All of one user's entries with timestamp >= cutoff.
    pub fn entries_since(
        &self,
        user_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<MoodEntry>, String> {
        let cutoff_str = cutoff.format(TIMESTAMP_FORMAT).to_string();
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT id, user_id, score, mood, timestamp FROM moods
                 WHERE user_id = ?1 AND timestamp >= ?2 ORDER BY id",
            )
            .map_err(|e| format!("Failed to prepare entry query: {e}"))?;

        let rows = stmt
            .query_map(params![user_id, cutoff_str], |row| {
                let score: Option<i64> = row.get(2)?;
                let label: Option<String> = row.get(3)?;
                Ok(MoodEntry {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    value: MoodValue::from_fields(score, label.as_deref()),
                    timestamp: row.get(4)?,
                })
            })
            .map_err(|e| format!("Failed to query mood entries: {e}"))?;

        let mut entries = Vec::new();
        for row in rows {
            match row {
                Ok(entry) => entries.push(entry),
                Err(e) => warn!("Skipping unreadable mood row: {e}"),
            }
        }
        Ok(entries)
    }
}
