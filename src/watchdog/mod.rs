//! Session watchdog: watches resolved responses for auth failures.
//!
//! ```text
//!  HttpClient call ──▶ InterceptingClient ──▶ ResponseClassifier
//!                                                  │
//!                  ┌───────────────────────────────┼──────────────────┐
//!                  ▼                               ▼                  ▼
//!        PrimarySessionExpired          SecondarySessionError       Ignore
//!        notify, wait, sign out,        RateLimiter (30s/channel)
//!        redirect to /login             ▶ BridgeReauthRequested
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! let registry = CancelRegistry::new();
//! let client = InterceptingClient::new(ReqwestHttpClient::new()).with_registry(registry);
//! let bus = EventBus::new();
//!
//! let watchdog = Watchdog::builder(Collaborators::new(session, navigator, notifier))
//!     .bus(bus.clone())
//!     .arm(&client)?;
//!
//! // The token manager can force expiry:
//! bus.session_expired("refresh token revoked");
//! ```

mod classifier;
mod controller;
mod matcher;
mod rate_limiter;
mod stats;

pub use classifier::{Classification, ResponseClassifier};
pub use controller::{
    Collaborators, ExpiryOutcome, Watchdog, WatchdogBuilder, WatchdogPhase,
    SESSION_EXPIRED_MESSAGE, WATCHDOG_SLOT,
};
pub use matcher::{parse_target, TargetMatcher};
pub use rate_limiter::{RateLimiter, DEFAULT_REAUTH_COOLDOWN};
pub use stats::WatchdogStats;
