//! SQLite-backed session key/value storage.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{Connection, OptionalExtension, params};

use crate::user::User;

use super::{PersistResult, SessionStorage, StoredSession};

const KEY_ACCESS_TOKEN: &str = "access_token";
const KEY_REFRESH_TOKEN: &str = "refresh_token";
const KEY_PROFILE: &str = "profile";

/// SQLite implementation of [`crate::persist::SessionStorage`].
pub struct SqliteSessionStorage {
    conn: Connection,
}

impl SqliteSessionStorage {
    /// Opens or creates session storage at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let conn = Connection::open(path)?;
        Self::init_connection(conn)
    }

    /// Opens an in-memory database.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn)
    }

    fn init_connection(conn: Connection) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn })
    }

    fn get(&self, key: &str) -> PersistResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM session WHERE key = ?1", params![key], |row| row.get(0))
            .optional()?;
        Ok(value)
    }

    fn put(&self, key: &str, value: &str) -> PersistResult<()> {
        self.conn.execute(
            "INSERT INTO session(key, value, updated_ms) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_ms = excluded.updated_ms",
            params![key, value, now_ms() as i64],
        )?;
        Ok(())
    }
}

impl SessionStorage for SqliteSessionStorage {
    fn load(&self) -> PersistResult<StoredSession> {
        let profile = match self.get(KEY_PROFILE)? {
            Some(raw) => Some(serde_json::from_str::<User>(&raw)?),
            None => None,
        };
        Ok(StoredSession {
            access_token: self.get(KEY_ACCESS_TOKEN)?,
            refresh_token: self.get(KEY_REFRESH_TOKEN)?,
            profile,
        })
    }

    fn save_tokens(&mut self, access_token: &str, refresh_token: &str) -> PersistResult<()> {
        let tx = self.conn.transaction()?;
        for (key, value) in [(KEY_ACCESS_TOKEN, access_token), (KEY_REFRESH_TOKEN, refresh_token)] {
            tx.execute(
                "INSERT INTO session(key, value, updated_ms) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_ms = excluded.updated_ms",
                params![key, value, now_ms() as i64],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn save_profile(&mut self, profile: &User) -> PersistResult<()> {
        let raw = serde_json::to_string(profile)?;
        self.put(KEY_PROFILE, &raw)
    }

    fn clear(&mut self) -> PersistResult<()> {
        self.conn.execute(
            "DELETE FROM session WHERE key IN (?1, ?2, ?3)",
            params![KEY_ACCESS_TOKEN, KEY_REFRESH_TOKEN, KEY_PROFILE],
        )?;
        Ok(())
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
