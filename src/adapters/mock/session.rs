//! In-memory auth session store for testing.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::SessionStoreError;
use crate::traits::AuthSessionStore;

/// Session store whose sign-out outcome is configurable.
///
/// Clones share state, so a test can keep one handle while the watchdog owns
/// another.
#[derive(Debug, Clone)]
pub struct MockSessionStore {
    active: Arc<AtomicBool>,
    sign_out_calls: Arc<AtomicUsize>,
    sign_out_error: Arc<Mutex<Option<SessionStoreError>>>,
}

impl MockSessionStore {
    /// A store with an active session.
    pub fn signed_in() -> Self {
        Self {
            active: Arc::new(AtomicBool::new(true)),
            sign_out_calls: Arc::new(AtomicUsize::new(0)),
            sign_out_error: Arc::new(Mutex::new(None)),
        }
    }

    /// A store with no session.
    pub fn signed_out() -> Self {
        let store = Self::signed_in();
        store.active.store(false, Ordering::SeqCst);
        store
    }

    /// Make every subsequent `sign_out` fail with `error`.
    pub fn fail_sign_out_with(&self, error: SessionStoreError) {
        *self.sign_out_error.lock().unwrap() = Some(error);
    }

    /// How many times `sign_out` was called.
    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockSessionStore {
    fn default() -> Self {
        Self::signed_in()
    }
}

#[async_trait]
impl AuthSessionStore for MockSessionStore {
    fn has_session(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    async fn sign_out(&self) -> Result<(), SessionStoreError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.sign_out_error.lock().unwrap().clone() {
            return Err(err);
        }
        self.active.store(false, Ordering::SeqCst);
        Ok(())
    }
}
