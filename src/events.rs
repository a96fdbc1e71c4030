//! Cross-component session signals.
//!
//! Signals travel over a tokio broadcast channel. Delivery is fire-and-forget:
//! publishing with no live subscriber is not an error for the publisher, and a
//! lagging subscriber loses the oldest signals rather than blocking anyone.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Default capacity of the signal channel.
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// A session-level signal exchanged between the watchdog and its collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// The primary session expired. Raised by the token manager; consumed by
    /// the watchdog. `reason` is only logged.
    SessionExpired { reason: String },

    /// Tear down every tracked in-flight request and open stream.
    GlobalCleanup,

    /// Ask the chat bridge client to re-authenticate `channel`.
    /// `timestamp` is epoch milliseconds.
    BridgeReauthRequested {
        channel: String,
        reason: String,
        timestamp: i64,
    },
}

impl SessionEvent {
    /// Short label for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionEvent::SessionExpired { .. } => "session_expired",
            SessionEvent::GlobalCleanup => "global_cleanup",
            SessionEvent::BridgeReauthRequested { .. } => "bridge_reauth_requested",
        }
    }
}

/// Publish/subscribe bus for [`SessionEvent`]s.
///
/// Cloning the bus shares the underlying channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionEvent>,
}

impl EventBus {
    /// Create a bus with [`DEFAULT_BUS_CAPACITY`].
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUS_CAPACITY)
    }

    /// Create a bus with the given capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future signals.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.tx.subscribe()
    }

    /// Publish a signal.
    ///
    /// Returns the number of subscribers that will see it. Zero subscribers is
    /// reported as an error so callers can decide whether to log it.
    pub fn publish(
        &self,
        event: SessionEvent,
    ) -> Result<usize, broadcast::error::SendError<SessionEvent>> {
        self.tx.send(event)
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Raise the token manager's "session expired" signal.
    pub fn session_expired(&self, reason: impl Into<String>) {
        let event = SessionEvent::SessionExpired {
            reason: reason.into(),
        };
        if self.publish(event).is_err() {
            tracing::debug!("session_expired published with no subscribers");
        }
    }

    /// Raise the "global cleanup" signal.
    pub fn global_cleanup(&self) {
        if self.publish(SessionEvent::GlobalCleanup).is_err() {
            tracing::debug!("global_cleanup published with no subscribers");
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
