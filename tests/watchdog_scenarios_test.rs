//! End-to-end watchdog behavior over the mock client.
//!
//! Covers:
//! 1. Primary 403 → one notification, sign-out after the delay, redirect to /login
//! 2. Failed sign-out still redirects
//! 3. Bridge errors inside the cooldown → one reauth signal
//! 4. Bridge errors outside the cooldown → one signal each
//! 5. Unrelated statuses and endpoints are ignored
//! 6. Expiry is idempotent, also when triggered by the SessionExpired signal

mod common;

use common::*;
use dailyfix_watchdog::config::WatchdogConfig;
use dailyfix_watchdog::error::SessionStoreError;
use dailyfix_watchdog::events::SessionEvent;
use dailyfix_watchdog::watchdog::{WatchdogPhase, SESSION_EXPIRED_MESSAGE};
use std::time::Duration;
use tokio::time::sleep;

#[tokio::test(start_paused = true)]
async fn test_primary_403_logs_out_after_delay() {
    let h = Harness::new();
    let watchdog = h.arm();

    let response = h.respond(AUTH_URL, 403).await.unwrap();
    assert_eq!(response.status, 403, "the caller still sees the response");

    assert_eq!(h.notifier.messages(), vec![SESSION_EXPIRED_MESSAGE.to_string()]);
    let (_, options) = &h.notifier.shown()[0];
    assert_eq!(options.duration, Duration::from_millis(4000));
    assert_eq!(watchdog.phase(), WatchdogPhase::Expiring);

    sleep(Duration::from_millis(1999)).await;
    assert_eq!(h.session.sign_out_calls(), 0);
    assert!(h.navigator.redirects().is_empty());

    sleep(Duration::from_millis(2)).await;
    assert_eq!(h.session.sign_out_calls(), 1);
    assert_eq!(h.navigator.redirects(), vec!["/login".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_sign_out_failure_still_redirects() {
    let h = Harness::new();
    h.session
        .fail_sign_out_with(SessionStoreError::SignOutFailed("network down".to_string()));
    let _watchdog = h.arm();

    h.respond(AUTH_URL, 403).await.unwrap();
    sleep(Duration::from_millis(2001)).await;

    assert_eq!(h.session.sign_out_calls(), 1);
    assert_eq!(h.navigator.redirects(), vec!["/login".to_string()]);
}

#[tokio::test]
async fn test_bridge_errors_within_cooldown_emit_once() {
    let h = Harness::new();
    let mut rx = h.bus.subscribe();
    let watchdog = h.arm();

    h.respond(MATRIX_URL, 401).await.unwrap();
    h.clock.advance(5000);
    h.respond(MATRIX_URL, 401).await.unwrap();

    let signals = reauth_signals(&drain(&mut rx));
    assert_eq!(
        signals,
        vec![(
            "matrix".to_string(),
            "matrix_auth_error".to_string(),
            START_MS
        )]
    );

    let stats = watchdog.stats();
    assert_eq!(stats.reauth_requested, 1);
    assert_eq!(stats.reauth_suppressed, 1);
    assert!(h.notifier.messages().is_empty());
    assert_eq!(watchdog.phase(), WatchdogPhase::Armed);
}

#[tokio::test]
async fn test_bridge_errors_after_cooldown_emit_again() {
    let h = Harness::new();
    let mut rx = h.bus.subscribe();
    let watchdog = h.arm();

    h.respond(MATRIX_URL, 403).await.unwrap();
    h.clock.advance(40_000);
    h.respond(MATRIX_URL, 403).await.unwrap();

    let timestamps: Vec<i64> = reauth_signals(&drain(&mut rx))
        .into_iter()
        .map(|(_, _, ts)| ts)
        .collect();
    assert_eq!(timestamps, vec![START_MS, START_MS + 40_000]);
    assert_eq!(watchdog.last_reauth_attempt("matrix"), Some(START_MS + 40_000));
}

#[tokio::test]
async fn test_cooldown_boundary_is_inclusive() {
    let h = Harness::new();
    let mut rx = h.bus.subscribe();
    let _watchdog = h.arm();

    h.respond(MATRIX_URL, 401).await.unwrap();
    h.clock.advance(29_999);
    h.respond(MATRIX_URL, 401).await.unwrap();
    h.clock.advance(1);
    h.respond(MATRIX_URL, 401).await.unwrap();

    assert_eq!(reauth_signals(&drain(&mut rx)).len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_responses_ignored() {
    let h = Harness::new();
    let mut rx = h.bus.subscribe();
    let watchdog = h.arm();

    h.respond(OTHER_URL, 500).await.unwrap();
    h.respond(OTHER_URL, 403).await.unwrap();
    h.respond(AUTH_URL, 401).await.unwrap();
    h.respond(AUTH_URL, 500).await.unwrap();
    h.respond(MATRIX_URL, 500).await.unwrap();
    h.respond(MATRIX_URL, 200).await.unwrap();
    sleep(Duration::from_millis(5000)).await;

    assert!(drain(&mut rx).is_empty());
    assert!(h.notifier.messages().is_empty());
    assert_eq!(h.session.sign_out_calls(), 0);
    assert!(h.navigator.redirects().is_empty());

    let stats = watchdog.stats();
    assert_eq!(stats.responses_observed, 6);
    assert_eq!(stats.reauth_requested, 0);
    assert_eq!(stats.expirations, 0);
}

#[tokio::test(start_paused = true)]
async fn test_bridge_path_wins_over_auth_segment() {
    let h = Harness::new();
    let mut rx = h.bus.subscribe();
    let _watchdog = h.arm();

    h.respond("https://api.dailyfix.app/api/v1/matrix/auth/token", 403)
        .await
        .unwrap();

    assert_eq!(reauth_signals(&drain(&mut rx)).len(), 1);
    assert!(h.notifier.messages().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_repeated_expiry_runs_flow_once() {
    let h = Harness::new();
    let mut rx = h.bus.subscribe();
    let watchdog = h.arm();

    h.respond(AUTH_URL, 403).await.unwrap();
    h.respond(AUTH_URL, 403).await.unwrap();
    // Bridge errors while expiring do not request reauth
    h.respond(MATRIX_URL, 401).await.unwrap();
    assert!(watchdog.expire("manual").is_none());

    sleep(Duration::from_millis(3000)).await;

    assert_eq!(h.notifier.messages().len(), 1);
    assert_eq!(h.session.sign_out_calls(), 1);
    assert_eq!(h.navigator.redirects().len(), 1);
    assert!(reauth_signals(&drain(&mut rx)).is_empty());
    assert_eq!(watchdog.stats().expirations, 1);
    assert_eq!(watchdog.stats().responses_observed, 3);
}

#[tokio::test(start_paused = true)]
async fn test_session_expired_signal_starts_flow() {
    let h = Harness::new();
    let watchdog = h.arm();

    h.bus.session_expired("refresh token revoked");
    sleep(Duration::from_millis(10)).await;

    assert_eq!(watchdog.phase(), WatchdogPhase::Expiring);
    assert_eq!(h.notifier.messages().len(), 1);

    // A 403 arriving during the flow changes nothing
    h.respond(AUTH_URL, 403).await.unwrap();
    h.bus.publish(SessionEvent::SessionExpired {
        reason: "again".to_string(),
    })
    .unwrap();

    sleep(Duration::from_millis(2500)).await;
    assert_eq!(h.notifier.messages().len(), 1);
    assert_eq!(h.session.sign_out_calls(), 1);
    assert_eq!(h.navigator.redirects(), vec!["/login".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_custom_config() {
    let h = Harness::new();
    let config = WatchdogConfig::default()
        .with_signout_delay(Duration::from_millis(500))
        .with_login_path("/signin");
    let _watchdog = h.arm_with(config);

    h.respond(AUTH_URL, 403).await.unwrap();
    sleep(Duration::from_millis(501)).await;

    assert_eq!(h.navigator.redirects(), vec!["/signin".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_teardown_stops_observation() {
    let h = Harness::new();
    let mut rx = h.bus.subscribe();
    let watchdog = h.arm();
    watchdog.teardown();
    assert_eq!(h.client.interceptor_count(), 0);

    h.respond(AUTH_URL, 403).await.unwrap();
    h.respond(MATRIX_URL, 401).await.unwrap();
    h.bus.session_expired("after teardown");
    sleep(Duration::from_millis(3000)).await;

    assert!(h.notifier.messages().is_empty());
    assert_eq!(h.session.sign_out_calls(), 0);
    assert!(reauth_signals(&drain(&mut rx)).is_empty());

    // Re-arming watches again
    let _again = h.arm();
    h.respond(MATRIX_URL, 401).await.unwrap();
    assert_eq!(reauth_signals(&drain(&mut rx)).len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_flow_completes_after_teardown() {
    let h = Harness::new();
    let watchdog = h.arm();

    h.respond(AUTH_URL, 403).await.unwrap();
    watchdog.teardown();
    sleep(Duration::from_millis(2001)).await;

    assert_eq!(h.session.sign_out_calls(), 1);
    assert_eq!(h.navigator.redirects(), vec!["/login".to_string()]);
}
