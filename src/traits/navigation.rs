//! Navigation service abstraction.

/// Redirects the user to another view of the host application.
///
/// Redirection is fire-and-forget: the watchdog never learns whether the
/// host actually navigated.
pub trait NavigationService: Send + Sync {
    /// Redirect to `path` (for example `/login`).
    fn redirect_to(&self, path: &str);
}
