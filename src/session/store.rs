//! Durable storage of the resolved `Session`.
//!
//! The persisted form mirrors what a browser keeps in local storage: three string-keyed entries,
//! `user` (the JSON-encoded identity), `apiUrl` and `sheetId`. A store only ever hands back a
//! complete `Session`; anything partial or unreadable is reported as absent.

use crate::session::{Session, User};
use crate::{fs, Result};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Get and put the resolved session. There is no expiry; a stored session is used until it is
/// replaced.
pub trait SessionStore: Send + Sync {
    /// Returns the stored session, or `None` if there is no complete session stored.
    fn get(&self) -> Result<Option<Session>>;

    /// Replaces whatever is stored with `session`.
    fn put(&self, session: &Session) -> Result<()>;
}

/// The on-disk entries.
#[derive(Debug, Default, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct StoredEntries {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(rename = "apiUrl", default, skip_serializing_if = "Option::is_none")]
    api_url: Option<String>,
    #[serde(rename = "sheetId", default, skip_serializing_if = "Option::is_none")]
    sheet_id: Option<String>,
}

impl StoredEntries {
    fn from_session(session: &Session) -> Result<Self> {
        let user = serde_json::to_string(session.user()).context("Unable to serialize user")?;
        Ok(Self {
            user: Some(user),
            api_url: Some(session.api_url().to_string()),
            sheet_id: Some(session.sheet_id().to_string()),
        })
    }

    fn into_session(self) -> Result<Option<Session>> {
        let (Some(user), Some(api_url), Some(sheet_id)) = (self.user, self.api_url, self.sheet_id)
        else {
            return Ok(None);
        };
        let user: User = serde_json::from_str(&user).context("The stored user is not valid")?;
        Session::parse(user, &api_url, sheet_id).map(Some)
    }
}

/// A `SessionStore` backed by a JSON file, typically `$FINSHEET_HOME/session.json`.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self) -> Result<Option<Session>> {
        let Some(content) = fs::read_optional(&self.path)? else {
            debug!("No session file at {}", self.path.display());
            return Ok(None);
        };
        let entries: StoredEntries = match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    "Ignoring unreadable session file {}: {e}",
                    self.path.display()
                );
                return Ok(None);
            }
        };
        match entries.into_session() {
            Ok(session) => Ok(session),
            Err(e) => {
                warn!("Ignoring invalid stored session: {e:#}");
                Ok(None)
            }
        }
    }

    fn put(&self, session: &Session) -> Result<()> {
        let entries = StoredEntries::from_session(session)?;
        let data = serde_json::to_string_pretty(&entries).context("Unable to serialize session")?;
        fs::write(&self.path, data).context("Unable to save the session")
    }
}

/// A `SessionStore` that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<Session>>,
}

impl MemorySessionStore {
    pub fn new(session: Option<Session>) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self) -> Result<Option<Session>> {
        let guard = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("The session store lock is poisoned"))?;
        Ok(guard.clone())
    }

    fn put(&self, session: &Session) -> Result<()> {
        let mut guard = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("The session store lock is poisoned"))?;
        *guard = Some(session.clone());
        Ok(())
    }
}
