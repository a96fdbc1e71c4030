//! The watchdog state machine.
//!
//! ```text
//!            primary expiry / SessionExpired signal
//!   Armed ─────────────────────────────────────────▶ Expiring
//!     │  secondary error: rate-limited reauth signal     │ notify, wait,
//!     │  ignore: nothing                                 │ sign out, redirect
//!     └──────────── teardown ──────────▶ TornDown ◀──────┘
//! ```
//!
//! Expiring is entered at most once per watchdog. A started expiration flow
//! runs to completion even if the watchdog is torn down meanwhile, so a
//! failed or interrupted logout never leaves the user on a dead session.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::FutureExt;

use tokio::runtime::Handle;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::classifier::{Classification, ResponseClassifier};
use super::rate_limiter::RateLimiter;
use super::stats::{StatsCounters, WatchdogStats};
use crate::cleanup::{spawn_cleanup_listener, CancelRegistry};
use crate::clock::{Clock, SystemClock};
use crate::config::WatchdogConfig;
use crate::error::{SessionStoreError, WatchdogError, WatchdogResult};
use crate::events::{EventBus, SessionEvent};
use crate::interceptor::{InterceptingClient, InterceptorHandle, ResponseInterceptor};
use crate::traits::{AuthSessionStore, HttpClient, NavigationService, NotificationSurface};

/// Message shown once when the primary session expires.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

/// Interceptor slot held by the armed watchdog of a client.
pub const WATCHDOG_SLOT: &str = "session-watchdog";

/// The host-side services the watchdog drives.
#[derive(Clone)]
pub struct Collaborators {
    pub session: Arc<dyn AuthSessionStore>,
    pub navigator: Arc<dyn NavigationService>,
    pub notifier: Arc<dyn NotificationSurface>,
}

impl Collaborators {
    pub fn new(
        session: Arc<dyn AuthSessionStore>,
        navigator: Arc<dyn NavigationService>,
        notifier: Arc<dyn NotificationSurface>,
    ) -> Self {
        Self {
            session,
            navigator,
            notifier,
        }
    }
}

impl fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// Lifecycle phase of a watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchdogPhase {
    Armed,
    Expiring,
    TornDown,
}

/// How the expiration flow ended. The login redirect happened either way.
#[derive(Debug, Clone)]
pub enum ExpiryOutcome {
    SignedOut,
    SignOutFailed(SessionStoreError),
}

impl ExpiryOutcome {
    pub fn is_signed_out(&self) -> bool {
        matches!(self, ExpiryOutcome::SignedOut)
    }
}

struct Core {
    classifier: ResponseClassifier,
    limiter: RateLimiter,
    config: WatchdogConfig,
    collaborators: Collaborators,
    bus: EventBus,
    clock: Arc<dyn Clock>,
    runtime: Handle,
    is_expiring: AtomicBool,
    torn_down: AtomicBool,
    stats: StatsCounters,
}

impl Core {
    fn dispatch(self: &Arc<Self>, classification: Classification, target: &str, status: u16) {
        match classification {
            Classification::Ignore => {}
            Classification::PrimarySessionExpired => {
                tracing::warn!(target_url = %target, status, "primary auth endpoint rejected session");
                self.expire(format!("{} from {}", status, target));
            }
            Classification::SecondarySessionError { channel } => {
                tracing::debug!(target_url = %target, status, %channel, "bridge auth error");
                self.request_bridge_reauth(&channel);
            }
        }
    }

    fn request_bridge_reauth(&self, channel: &str) {
        let now = self.clock.now_ms();
        if !self.limiter.try_acquire(channel, now) {
            self.stats.reauth_suppressed();
            tracing::debug!(%channel, "bridge reauth suppressed by cooldown");
            return;
        }

        let event = SessionEvent::BridgeReauthRequested {
            channel: channel.to_string(),
            reason: format!("{}_auth_error", channel),
            timestamp: now,
        };
        // Our own listeners keep the bus subscribed while armed
        let receivers = self.bus.publish(event).unwrap_or(0);
        tracing::info!(%channel, receivers, "requested bridge re-authentication");
        self.stats.reauth_requested();
    }

    /// Start the expiration flow unless it already started.
    fn expire(self: &Arc<Self>, reason: String) -> Option<JoinHandle<ExpiryOutcome>> {
        if self
            .is_expiring
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(%reason, "expiration already in progress");
            return None;
        }

        self.stats.expiration();
        tracing::warn!(%reason, "session expired, logging out");
        let notified = catch_unwind(AssertUnwindSafe(|| {
            self.collaborators
                .notifier
                .show_error(SESSION_EXPIRED_MESSAGE, &self.config.notification_options())
        }));
        if notified.is_err() {
            tracing::error!("expiry notification panicked, continuing logout");
        }

        let core = Arc::clone(self);
        Some(self.runtime.spawn(async move { core.run_expiry().await }))
    }

    async fn run_expiry(&self) -> ExpiryOutcome {
        tokio::time::sleep(self.config.signout_delay()).await;

        let sign_out = AssertUnwindSafe(self.collaborators.session.sign_out())
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                Err(SessionStoreError::SignOutFailed(
                    "sign out panicked".to_string(),
                ))
            });

        let outcome = match sign_out {
            Ok(()) => {
                tracing::info!("signed out after session expiry");
                ExpiryOutcome::SignedOut
            }
            Err(e) => {
                tracing::error!(error = %e, code = e.error_code(), "sign out failed, redirecting anyway");
                ExpiryOutcome::SignOutFailed(e)
            }
        };

        self.collaborators
            .navigator
            .redirect_to(&self.config.login_path);
        outcome
    }

    fn phase(&self) -> WatchdogPhase {
        if self.torn_down.load(Ordering::SeqCst) {
            WatchdogPhase::TornDown
        } else if self.is_expiring.load(Ordering::SeqCst) {
            WatchdogPhase::Expiring
        } else {
            WatchdogPhase::Armed
        }
    }
}

/// Registered on the client; forwards responses into the core.
struct CoreInterceptor(Arc<Core>);

impl ResponseInterceptor for CoreInterceptor {
    fn on_response(&self, target: &str, status: u16) {
        let core = &self.0;
        if core.torn_down.load(Ordering::SeqCst) {
            return;
        }
        core.stats.observed();
        if core.is_expiring.load(Ordering::SeqCst) {
            return;
        }
        let classification = core.classifier.classify(target, status);
        core.dispatch(classification, target, status);
    }
}

/// Builder for [`Watchdog`].
///
/// # Example
///
/// ```ignore
/// let client = InterceptingClient::new(ReqwestHttpClient::new()).with_registry(registry.clone());
/// let watchdog = Watchdog::builder(collaborators)
///     .config(WatchdogConfig::from_env()?)
///     .bus(bus.clone())
///     .arm(&client)?;
/// ```
pub struct WatchdogBuilder {
    collaborators: Collaborators,
    config: WatchdogConfig,
    bus: Option<EventBus>,
    registry: Option<CancelRegistry>,
    clock: Arc<dyn Clock>,
}

impl WatchdogBuilder {
    pub fn config(mut self, config: WatchdogConfig) -> Self {
        self.config = config;
        self
    }

    /// Load configuration from an optional JSON file, then apply
    /// `DAILYFIX_*` environment overrides.
    pub fn load_config(mut self, path: Option<&Path>) -> WatchdogResult<Self> {
        let config = match path {
            Some(path) => WatchdogConfig::from_json_file(path)?,
            None => WatchdogConfig::default(),
        };
        self.config = config.apply_env()?;
        Ok(self)
    }

    /// Signal bus shared with the token manager and the bridge client.
    pub fn bus(mut self, bus: EventBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Registry cleared on a global cleanup. Defaults to the client's registry.
    pub fn registry(mut self, registry: CancelRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Install the watchdog on `client`.
    ///
    /// Fails if there is no active session, if `client` already has an armed
    /// watchdog, or if called outside a tokio runtime.
    pub fn arm<C: HttpClient>(self, client: &InterceptingClient<C>) -> WatchdogResult<Watchdog> {
        if !self.collaborators.session.has_session() {
            return Err(WatchdogError::NoSession);
        }
        let runtime = Handle::try_current().map_err(|_| WatchdogError::NoRuntime)?;

        let bus = self.bus.unwrap_or_default();
        let registry = self.registry.or_else(|| client.registry().cloned());

        let core = Arc::new(Core {
            classifier: self.config.classifier(),
            limiter: RateLimiter::new(self.config.reauth_cooldown()),
            config: self.config,
            collaborators: self.collaborators,
            bus: bus.clone(),
            clock: self.clock,
            runtime: runtime.clone(),
            is_expiring: AtomicBool::new(false),
            torn_down: AtomicBool::new(false),
            stats: StatsCounters::default(),
        });

        let registration = client
            .register_exclusive(WATCHDOG_SLOT, Arc::new(CoreInterceptor(Arc::clone(&core))))
            .ok_or(WatchdogError::AlreadyArmed)?;

        let mut listeners = vec![spawn_signal_listener(&runtime, &bus, Arc::clone(&core))];
        if let Some(registry) = registry {
            listeners.push(spawn_cleanup_listener(&bus, registry));
        }

        tracing::info!(
            bridge_channel = %core.config.bridge_channel,
            cooldown_ms = core.config.reauth_cooldown_ms,
            "session watchdog armed"
        );

        Ok(Watchdog {
            core,
            registration: Some(registration),
            listeners,
        })
    }
}

fn spawn_signal_listener(runtime: &Handle, bus: &EventBus, core: Arc<Core>) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    runtime.spawn(async move {
        loop {
            match rx.recv().await {
                Ok(SessionEvent::SessionExpired { reason }) => {
                    if core.torn_down.load(Ordering::SeqCst) {
                        break;
                    }
                    tracing::debug!(%reason, "session expired signal received");
                    core.expire(reason);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "watchdog lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// An armed session watchdog.
///
/// Dropping it tears it down: the interceptor is unregistered and the signal
/// listeners stop. A new watchdog must be armed to watch again.
pub struct Watchdog {
    core: Arc<Core>,
    registration: Option<InterceptorHandle>,
    listeners: Vec<JoinHandle<()>>,
}

impl Watchdog {
    pub fn builder(collaborators: Collaborators) -> WatchdogBuilder {
        WatchdogBuilder {
            collaborators,
            config: WatchdogConfig::default(),
            bus: None,
            registry: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn phase(&self) -> WatchdogPhase {
        self.core.phase()
    }

    pub fn is_expiring(&self) -> bool {
        self.core.is_expiring.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> WatchdogStats {
        self.core.stats.snapshot()
    }

    pub fn config(&self) -> &WatchdogConfig {
        &self.core.config
    }

    /// Last bridge re-auth request on `channel`, in epoch milliseconds.
    pub fn last_reauth_attempt(&self, channel: &str) -> Option<i64> {
        self.core.limiter.last_attempt(channel)
    }

    /// Start the expiration flow directly.
    ///
    /// Returns the flow's task, or `None` if it already started or the
    /// watchdog was torn down.
    pub fn expire(&self, reason: impl Into<String>) -> Option<JoinHandle<ExpiryOutcome>> {
        if self.core.torn_down.load(Ordering::SeqCst) {
            return None;
        }
        self.core.expire(reason.into())
    }

    /// Reverse interception and stop listening.
    pub fn teardown(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.core.torn_down.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(registration) = self.registration.take() {
            registration.remove();
        }
        for listener in self.listeners.drain(..) {
            listener.abort();
        }
        tracing::info!("session watchdog torn down");
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl fmt::Debug for Watchdog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Watchdog")
            .field("phase", &self.phase())
            .field("stats", &self.stats())
            .finish()
    }
}
