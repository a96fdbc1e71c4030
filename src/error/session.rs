//! Auth session store errors.

use thiserror::Error;

/// Errors raised by an [`AuthSessionStore`](crate::traits::AuthSessionStore).
#[derive(Debug, Clone, Error)]
pub enum SessionStoreError {
    /// The backend refused or failed the sign-out call.
    #[error("Sign out failed: {0}")]
    SignOutFailed(String),

    /// The session file could not be read or removed.
    #[error("Session store IO error: {0}")]
    Io(String),

    /// The session file exists but is not valid JSON.
    #[error("Session store serialization error: {0}")]
    Serialization(String),
}

impl SessionStoreError {
    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            SessionStoreError::SignOutFailed(_) => "E_SESSION_SIGNOUT",
            SessionStoreError::Io(_) => "E_SESSION_IO",
            SessionStoreError::Serialization(_) => "E_SESSION_SERDE",
        }
    }
}

impl From<std::io::Error> for SessionStoreError {
    fn from(err: std::io::Error) -> Self {
        SessionStoreError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SessionStoreError {
    fn from(err: serde_json::Error) -> Self {
        SessionStoreError::Serialization(err.to_string())
    }
}
