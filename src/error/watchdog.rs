//! Watchdog lifecycle errors.

use thiserror::Error;

use super::config::ConfigError;

/// Errors raised when arming a watchdog.
///
/// Nothing that happens after arming surfaces as an error: runtime failures
/// inside the watchdog are logged and contained.
#[derive(Debug, Error)]
pub enum WatchdogError {
    /// No primary session is present, so there is nothing to watch.
    #[error("Cannot arm watchdog without an active session")]
    NoSession,

    /// The client already carries a watchdog interceptor.
    #[error("A watchdog is already armed on this client")]
    AlreadyArmed,

    /// Arming needs a tokio runtime to host the listener tasks.
    #[error("Watchdog must be armed from within a tokio runtime")]
    NoRuntime,

    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl WatchdogError {
    /// Short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            WatchdogError::NoSession => "E_WATCHDOG_NO_SESSION",
            WatchdogError::AlreadyArmed => "E_WATCHDOG_ARMED",
            WatchdogError::NoRuntime => "E_WATCHDOG_RUNTIME",
            WatchdogError::Config(err) => err.error_code(),
        }
    }
}
