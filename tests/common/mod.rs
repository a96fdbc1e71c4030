//! Common test utilities for integration tests.
//!
//! [`Harness`] wires a watchdog to mock collaborators, a manual clock and a
//! registry-aware client over [`MockHttpClient`].

#![allow(dead_code)]

use std::sync::Arc;

use dailyfix_watchdog::adapters::mock::{
    MockHttpClient, MockNavigator, MockNotifier, MockResponse, MockSessionStore,
};
use dailyfix_watchdog::cleanup::CancelRegistry;
use dailyfix_watchdog::clock::ManualClock;
use dailyfix_watchdog::config::WatchdogConfig;
use dailyfix_watchdog::events::{EventBus, SessionEvent};
use dailyfix_watchdog::interceptor::InterceptingClient;
use dailyfix_watchdog::traits::{Headers, HttpClient, HttpError, Response};
use dailyfix_watchdog::watchdog::{Collaborators, Watchdog};
use tokio::sync::broadcast;

/// Epoch milliseconds the manual clock starts at.
pub const START_MS: i64 = 1_700_000_000_000;

pub const AUTH_URL: &str = "https://api.dailyfix.app/auth/v1/user";
pub const MATRIX_URL: &str = "https://api.dailyfix.app/api/v1/matrix/status";
pub const OTHER_URL: &str = "https://api.dailyfix.app/api/v1/other";

pub struct Harness {
    pub http: MockHttpClient,
    pub client: Arc<InterceptingClient<MockHttpClient>>,
    pub registry: CancelRegistry,
    pub session: MockSessionStore,
    pub navigator: MockNavigator,
    pub notifier: MockNotifier,
    pub clock: ManualClock,
    pub bus: EventBus,
}

impl Harness {
    pub fn new() -> Self {
        let http = MockHttpClient::new();
        let registry = CancelRegistry::new();
        Self {
            client: Arc::new(InterceptingClient::new(http.clone()).with_registry(registry.clone())),
            http,
            registry,
            session: MockSessionStore::signed_in(),
            navigator: MockNavigator::new(),
            notifier: MockNotifier::new(),
            clock: ManualClock::new(START_MS),
            bus: EventBus::new(),
        }
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators::new(
            Arc::new(self.session.clone()),
            Arc::new(self.navigator.clone()),
            Arc::new(self.notifier.clone()),
        )
    }

    /// Arm with default configuration.
    pub fn arm(&self) -> Watchdog {
        self.arm_with(WatchdogConfig::default())
    }

    pub fn arm_with(&self, config: WatchdogConfig) -> Watchdog {
        Watchdog::builder(self.collaborators())
            .config(config)
            .bus(self.bus.clone())
            .clock(Arc::new(self.clock.clone()))
            .arm(&self.client)
            .expect("watchdog should arm")
    }

    /// Issue a GET that resolves with `status`.
    pub async fn respond(&self, url: &str, status: u16) -> Result<Response, HttpError> {
        self.http
            .set_response(url, MockResponse::Success(Response::status_only(status)));
        self.client.get(url, &Headers::new()).await
    }
}

/// Every event currently buffered on `rx`.
pub fn drain(rx: &mut broadcast::Receiver<SessionEvent>) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

/// Only the bridge reauth signals among `events`, as `(channel, reason, timestamp)`.
pub fn reauth_signals(events: &[SessionEvent]) -> Vec<(String, String, i64)> {
    events
        .iter()
        .filter_map(|event| match event {
            SessionEvent::BridgeReauthRequested {
                channel,
                reason,
                timestamp,
            } => Some((channel.clone(), reason.clone(), *timestamp)),
            _ => None,
        })
        .collect()
}
