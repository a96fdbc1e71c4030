//! Error types for the session watchdog.
//!
//! Only arming and configuration can fail from a caller's point of view.
//! Everything after that (sign-out failures, cancel failures, classification
//! panics) is contained inside the watchdog and reported through `tracing`.
//!
//! | Type | Raised by | Surfaced to caller |
//! |------|-----------|--------------------|
//! | [`WatchdogError`] | `Watchdog::arm` | Yes |
//! | [`ConfigError`] | `WatchdogConfig` loading | Yes |
//! | [`SessionStoreError`] | `AuthSessionStore::sign_out` | No, logged |
//! | [`CleanupError`] | registry entries | No, swallowed |

mod cleanup;
mod config;
mod session;
mod watchdog;

pub use cleanup::CleanupError;
pub use config::ConfigError;
pub use session::SessionStoreError;
pub use watchdog::WatchdogError;

/// Result alias for watchdog lifecycle operations.
pub type WatchdogResult<T> = Result<T, WatchdogError>;
