//! File-backed auth session store.
//!
//! The primary session lives in `~/.dailyfix/.session.json`. Signing out
//! removes the file.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::SessionStoreError;
use crate::traits::AuthSessionStore;

/// The session directory name.
const SESSION_DIR: &str = ".dailyfix";

/// The session file name.
const SESSION_FILE: &str = ".session.json";

/// Primary session as persisted by the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StoredSession {
    /// Identity-provider access token.
    pub access_token: Option<String>,
    /// Identity-provider refresh token.
    pub refresh_token: Option<String>,
    /// Token expiration time as Unix timestamp (seconds since epoch).
    pub expires_at: Option<i64>,
    /// The signed-in user's ID.
    pub user_id: Option<String>,
}

impl StoredSession {
    pub fn has_token(&self) -> bool {
        self.access_token.is_some()
    }

    /// Whether the access token has expired. Sessions without an expiry never do.
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => chrono::Utc::now().timestamp() >= expires_at,
            None => false,
        }
    }
}

/// [`AuthSessionStore`] reading and deleting a JSON session file.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Store at the default location under the home directory.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn new() -> Option<Self> {
        let home = dirs::home_dir()?;
        Some(Self::at(home.join(SESSION_DIR).join(SESSION_FILE)))
    }

    /// Store at an explicit path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored session, `None` if there is no session file.
    pub fn load(&self) -> Result<Option<StoredSession>, SessionStoreError> {
        let file = match File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(session))
    }

    /// Persist a session, creating the parent directory if needed.
    pub fn save(&self, session: &StoredSession) -> Result<(), SessionStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, session)?;
        writer.flush()?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }

        Ok(())
    }
}

#[async_trait]
impl AuthSessionStore for FileSessionStore {
    fn has_session(&self) -> bool {
        match self.load() {
            Ok(Some(session)) => session.has_token(),
            Ok(None) => false,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "unreadable session file");
                false
            }
        }
    }

    async fn sign_out(&self) -> Result<(), SessionStoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                tracing::debug!(path = %self.path.display(), "session file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionStoreError::SignOutFailed(e.to_string())),
        }
    }
}
