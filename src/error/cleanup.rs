//! Cancellation / close failures reported by registry entries.

use thiserror::Error;

/// A pending request or open stream could not be cancelled or closed.
///
/// The cancel registry swallows these; they exist so entries can report
/// what went wrong for debug logging.
#[derive(Debug, Clone, Error)]
pub enum CleanupError {
    /// The operation had already finished or its receiver was gone.
    #[error("Entry already completed")]
    AlreadyCompleted,

    /// Closing the underlying resource failed.
    #[error("Close failed: {0}")]
    CloseFailed(String),
}
