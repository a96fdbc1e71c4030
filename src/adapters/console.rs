//! Headless collaborators that report through `tracing`.
//!
//! Used by the probe binary and by hosts without a UI surface.

use std::sync::{Arc, Mutex};

use crate::traits::{NavigationService, NotificationOptions, NotificationSurface};

/// Notification surface that logs messages instead of displaying them.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl NotificationSurface for TracingNotifier {
    fn show_error(&self, message: &str, options: &NotificationOptions) {
        tracing::error!(
            duration_ms = options.duration.as_millis() as u64,
            id = options.id.as_deref().unwrap_or(""),
            "{}",
            message
        );
    }
}

/// Navigator that logs redirects and remembers the latest one.
#[derive(Debug, Clone, Default)]
pub struct LoggingNavigator {
    last: Arc<Mutex<Option<String>>>,
}

impl LoggingNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent redirect target.
    pub fn last_redirect(&self) -> Option<String> {
        self.last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl NavigationService for LoggingNavigator {
    fn redirect_to(&self, path: &str) {
        tracing::info!(%path, "redirect requested");
        *self
            .last
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(path.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logging_navigator_remembers_last() {
        let navigator = LoggingNavigator::new();
        assert_eq!(navigator.last_redirect(), None);
        navigator.redirect_to("/login");
        navigator.clone().redirect_to("/onboarding");
        assert_eq!(navigator.last_redirect().as_deref(), Some("/onboarding"));
    }

    #[test]
    fn test_tracing_notifier_does_not_panic() {
        TracingNotifier.show_error("Your session has expired.", &NotificationOptions::default());
    }
}
