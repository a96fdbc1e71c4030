//! Counters describing what a watchdog has done.

use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time snapshot of watchdog activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchdogStats {
    /// Resolved responses seen while armed
    pub responses_observed: u64,
    /// Bridge re-auth signals emitted
    pub reauth_requested: u64,
    /// Bridge re-auth signals dropped by the cooldown
    pub reauth_suppressed: u64,
    /// Expiration flows started (0 or 1)
    pub expirations: u64,
}

#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    responses_observed: AtomicU64,
    reauth_requested: AtomicU64,
    reauth_suppressed: AtomicU64,
    expirations: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn observed(&self) {
        self.responses_observed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reauth_requested(&self) {
        self.reauth_requested.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn reauth_suppressed(&self) {
        self.reauth_suppressed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn expiration(&self) {
        self.expirations.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> WatchdogStats {
        WatchdogStats {
            responses_observed: self.responses_observed.load(Ordering::Relaxed),
            reauth_requested: self.reauth_requested.load(Ordering::Relaxed),
            reauth_suppressed: self.reauth_suppressed.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
        }
    }
}
