//! Global cleanup through the event bus.
//!
//! An armed watchdog listens for `GlobalCleanup` on behalf of the client's
//! registry: in-flight requests resolve to `HttpError::Cancelled`, open
//! streams end, and the registry is left empty.

mod common;

use bytes::Bytes;
use common::*;
use dailyfix_watchdog::adapters::mock::MockResponse;
use dailyfix_watchdog::cleanup::{cancel_fn, spawn_cleanup_listener, CancelRegistry};
use dailyfix_watchdog::error::CleanupError;
use dailyfix_watchdog::events::EventBus;
use dailyfix_watchdog::traits::{Headers, HttpClient, HttpError};
use futures::StreamExt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition should hold");
}

#[tokio::test]
async fn test_cleanup_cancels_in_flight_request() {
    let h = Harness::new();
    let _watchdog = h.arm();
    h.http.set_response(OTHER_URL, MockResponse::Pending);

    let client = Arc::clone(&h.client);
    let request = tokio::spawn(async move { client.get(OTHER_URL, &Headers::new()).await });

    let registry = h.registry.clone();
    wait_until(|| registry.pending_requests() == 1).await;

    h.bus.global_cleanup();

    let result = tokio::time::timeout(Duration::from_secs(2), request)
        .await
        .expect("request should resolve")
        .unwrap();
    assert!(matches!(result, Err(HttpError::Cancelled)));
    assert!(h.registry.is_empty());
}

#[tokio::test]
async fn test_cleanup_closes_open_stream() {
    let h = Harness::new();
    let _watchdog = h.arm();
    h.http.set_response(
        MATRIX_URL,
        MockResponse::Stream(vec![Bytes::from("one"), Bytes::from("two")]),
    );

    let mut stream = h
        .client
        .post_stream(MATRIX_URL, "{}", &Headers::new())
        .await
        .ok()
        .expect("stream should open");
    assert_eq!(h.registry.open_streams(), 1);
    assert_eq!(stream.next().await.unwrap().unwrap(), Bytes::from("one"));

    h.bus.global_cleanup();
    let registry = h.registry.clone();
    wait_until(|| registry.is_empty()).await;

    assert!(stream.next().await.is_none(), "aborted stream yields nothing more");
}

#[tokio::test]
async fn test_finished_work_leaves_registry() {
    let h = Harness::new();
    let _watchdog = h.arm();

    h.respond(OTHER_URL, 200).await.unwrap();
    assert_eq!(h.registry.pending_requests(), 0);

    h.http.set_response(MATRIX_URL, MockResponse::Stream(vec![Bytes::from("x")]));
    let stream = h
        .client
        .post_stream(MATRIX_URL, "{}", &Headers::new())
        .await
        .ok()
        .expect("stream should open");
    assert_eq!(h.registry.open_streams(), 1);
    drop(stream);
    assert!(h.registry.is_empty());
}

#[tokio::test]
async fn test_cleanup_with_nothing_registered() {
    let bus = EventBus::new();
    let registry = CancelRegistry::new();
    let listener = spawn_cleanup_listener(&bus, registry.clone());

    bus.global_cleanup();
    bus.global_cleanup();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(registry.is_empty());
    assert!(!listener.is_finished());
    listener.abort();
}

#[tokio::test]
async fn test_failing_entries_do_not_stop_cleanup() {
    let registry = CancelRegistry::new();
    let closed = Arc::new(AtomicUsize::new(0));

    let _failing = registry.register_stream(cancel_fn(|| {
        Err(CleanupError::CloseFailed("socket already closed".to_string()))
    }));
    let _panicking = registry.register_request(cancel_fn(|| -> Result<(), CleanupError> {
        panic!("abort handler bug")
    }));
    let counter = Arc::clone(&closed);
    let _ok = registry.register_stream(cancel_fn(move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }));

    let report = registry.cleanup();

    assert_eq!(report.total(), 3);
    assert_eq!(report.failures, 2);
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert!(registry.is_empty());
}

#[tokio::test]
async fn test_explicit_registry_overrides_client_registry() {
    let h = Harness::new();
    let other = CancelRegistry::new();
    let _watchdog = dailyfix_watchdog::watchdog::Watchdog::builder(h.collaborators())
        .bus(h.bus.clone())
        .registry(other.clone())
        .arm(&h.client)
        .unwrap();

    let _entry = other.register_request(cancel_fn(|| Ok(())));
    h.bus.global_cleanup();

    let registry = other.clone();
    wait_until(|| registry.is_empty()).await;
}
