pub mod sqlite;

use crate::user::User;

/// Session storage failures.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    /// SQLite error.
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Stored profile could not be encoded or decoded.
    #[error("serde: {0}")]
    Serde(#[from] serde_json::Error),
    /// Other storage failure.
    #[error("{0}")]
    Message(String),
}

/// Result alias for session storage.
pub type PersistResult<T> = Result<T, PersistError>;

/// Session values that survive restarts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSession {
    /// Token sent in the `authorization` header.
    pub access_token: Option<String>,
    /// Refresh token, kept but unused.
    pub refresh_token: Option<String>,
    /// Last known profile.
    pub profile: Option<User>,
}

/// Key/value home for the auth session.
pub trait SessionStorage: Send {
    /// Reads everything stored; missing keys come back as `None`.
    fn load(&self) -> PersistResult<StoredSession>;
    /// Stores both tokens together.
    fn save_tokens(&mut self, access_token: &str, refresh_token: &str) -> PersistResult<()>;
    /// Stores the profile.
    fn save_profile(&mut self, profile: &User) -> PersistResult<()>;
    /// Removes tokens and profile.
    fn clear(&mut self) -> PersistResult<()>;
}

/// Non-durable storage for tests and short-lived sessions.
#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    session: StoredSession,
}

impl MemorySessionStorage {
    /// Empty storage.
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> PersistResult<StoredSession> {
        Ok(self.session.clone())
    }

    fn save_tokens(&mut self, access_token: &str, refresh_token: &str) -> PersistResult<()> {
        self.session.access_token = Some(access_token.to_string());
        self.session.refresh_token = Some(refresh_token.to_string());
        Ok(())
    }

    fn save_profile(&mut self, profile: &User) -> PersistResult<()> {
        self.session.profile = Some(profile.clone());
        Ok(())
    }

    fn clear(&mut self) -> PersistResult<()> {
        self.session = StoredSession::default();
        Ok(())
    }
}
