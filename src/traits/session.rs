//! Auth session store abstraction.
//!
//! The session store owns the primary (identity-provider) session. The
//! watchdog only asks whether a session exists and, on expiry, asks the store
//! to sign out.

use async_trait::async_trait;

use crate::error::SessionStoreError;

/// Trait for the primary auth session store.
///
/// # Example
///
/// ```ignore
/// use dailyfix_watchdog::traits::AuthSessionStore;
///
/// async fn logout<S: AuthSessionStore>(store: &S) {
///     if let Err(e) = store.sign_out().await {
///         tracing::warn!(error = %e, "sign out failed");
///     }
/// }
/// ```
#[async_trait]
pub trait AuthSessionStore: Send + Sync {
    /// Whether a primary session is currently present.
    fn has_session(&self) -> bool;

    /// End the primary session.
    async fn sign_out(&self) -> Result<(), SessionStoreError>;
}
