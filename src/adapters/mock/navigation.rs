//! Recording navigation service for testing.

use std::sync::{Arc, Mutex};

use crate::traits::NavigationService;

/// Navigator that records every redirect.
#[derive(Debug, Clone, Default)]
pub struct MockNavigator {
    redirects: Arc<Mutex<Vec<String>>>,
}

impl MockNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Paths redirected to, in order.
    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }
}

impl NavigationService for MockNavigator {
    fn redirect_to(&self, path: &str) {
        self.redirects.lock().unwrap().push(path.to_string());
    }
}
