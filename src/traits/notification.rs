//! Notification surface abstraction.

use std::time::Duration;

/// Display options for a transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationOptions {
    /// How long the message stays visible
    pub duration: Duration,
    /// Stable identifier so the host can replace rather than stack duplicates
    pub id: Option<String>,
}

impl NotificationOptions {
    /// Options with the given display duration and no identifier.
    pub fn with_duration(duration: Duration) -> Self {
        Self { duration, id: None }
    }

    /// Attach a stable identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Default for NotificationOptions {
    fn default() -> Self {
        Self::with_duration(Duration::from_millis(4000))
    }
}

/// Displays transient user-facing messages.
///
/// Calls are synchronous and fire-and-forget.
pub trait NotificationSurface: Send + Sync {
    /// Show an error message.
    fn show_error(&self, message: &str, options: &NotificationOptions);
}
