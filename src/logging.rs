//! Tracing subscriber setup for binaries embedding the watchdog.

use tracing_subscriber::EnvFilter;

/// Install a `fmt` subscriber filtered by `RUST_LOG`.
///
/// Falls back to `default_directive` (e.g. `"dailyfix_watchdog=info"`) when
/// `RUST_LOG` is unset or invalid. Calling this twice is harmless; the second
/// install is ignored.
pub fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .try_init();
}
