//! Recording notification surface for testing.

use std::sync::{Arc, Mutex};

use crate::traits::{NotificationOptions, NotificationSurface};

/// Notifier that records every message shown.
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    shown: Arc<Mutex<Vec<(String, NotificationOptions)>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Messages shown, in order.
    pub fn messages(&self) -> Vec<String> {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .map(|(message, _)| message.clone())
            .collect()
    }

    /// Messages with the options they were shown with.
    pub fn shown(&self) -> Vec<(String, NotificationOptions)> {
        self.shown.lock().unwrap().clone()
    }
}

impl NotificationSurface for MockNotifier {
    fn show_error(&self, message: &str, options: &NotificationOptions) {
        self.shown
            .lock()
            .unwrap()
            .push((message.to_string(), options.clone()));
    }
}
