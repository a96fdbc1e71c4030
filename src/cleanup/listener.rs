//! Reacts to the "global cleanup" signal.

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use super::registry::CancelRegistry;
use crate::events::{EventBus, SessionEvent};

/// Spawn a task that runs [`CancelRegistry::cleanup`] on every
/// [`SessionEvent::GlobalCleanup`].
///
/// The task ends when the bus closes. Abort the handle to stop it earlier.
pub fn spawn_cleanup_listener(bus: &EventBus, registry: CancelRegistry) -> JoinHandle<()> {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(SessionEvent::GlobalCleanup) => {
                    tracing::debug!("global cleanup signal received");
                    registry.cleanup();
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "cleanup listener lagged behind the event bus");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::cancel_fn;
    use std::time::Duration;

    #[tokio::test]
    async fn test_listener_runs_cleanup_on_signal() {
        let bus = EventBus::new();
        let registry = CancelRegistry::new();
        let handle = spawn_cleanup_listener(&bus, registry.clone());

        let _a = registry.register_request(cancel_fn(|| Ok(())));
        let _b = registry.register_stream(cancel_fn(|| Ok(())));
        assert!(!registry.is_empty());

        bus.global_cleanup();

        tokio::time::timeout(Duration::from_secs(1), async {
            while !registry.is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("registry should be emptied");

        handle.abort();
    }

    #[tokio::test]
    async fn test_listener_ignores_other_signals() {
        let bus = EventBus::new();
        let registry = CancelRegistry::new();
        let handle = spawn_cleanup_listener(&bus, registry.clone());
        let _a = registry.register_request(cancel_fn(|| Ok(())));

        bus.session_expired("unrelated");
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(registry.pending_requests(), 1);

        handle.abort();
    }
}
