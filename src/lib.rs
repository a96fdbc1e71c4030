//! DailyFix session watchdog - detects expired credentials from HTTP responses
//!
//! The watchdog observes every response resolved through an
//! [`InterceptingClient`](interceptor::InterceptingClient). Primary session
//! expiry logs the user out once; messaging-bridge auth errors request a
//! rate-limited re-authentication. A global cleanup signal cancels all
//! tracked in-flight requests and open streams.

pub mod adapters;
pub mod cleanup;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod interceptor;
pub mod logging;
pub mod traits;
pub mod watchdog;

pub use cleanup::{CancelRegistry, CleanupReport};
pub use config::WatchdogConfig;
pub use error::{WatchdogError, WatchdogResult};
pub use events::{EventBus, SessionEvent};
pub use interceptor::{InterceptingClient, ResponseInterceptor};
pub use watchdog::{Classification, Collaborators, ResponseClassifier, Watchdog};
