//! Per-channel cooldown for re-authentication requests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Default cooldown between re-authentication requests on one channel.
pub const DEFAULT_REAUTH_COOLDOWN: Duration = Duration::from_millis(30_000);

/// Tracks when each re-authentication channel last fired.
///
/// Records are never expired; there is one per distinct backend channel.
#[derive(Debug)]
pub struct RateLimiter {
    cooldown_ms: i64,
    last_attempt: Mutex<HashMap<String, i64>>,
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown_ms: i64::try_from(cooldown.as_millis()).unwrap_or(i64::MAX),
            last_attempt: Mutex::new(HashMap::new()),
        }
    }

    /// Configured cooldown.
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms as u64)
    }

    fn admits(&self, last: Option<i64>, now_ms: i64) -> bool {
        match last {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.cooldown_ms,
        }
    }

    /// Whether a new attempt on `channel` is allowed at `now_ms`.
    pub fn should_attempt(&self, channel: &str, now_ms: i64) -> bool {
        let records = self.lock();
        self.admits(records.get(channel).copied(), now_ms)
    }

    /// Record an attempt on `channel`, overwriting any previous record.
    pub fn record_attempt(&self, channel: &str, now_ms: i64) {
        self.lock().insert(channel.to_string(), now_ms);
    }

    /// Check and record in one step.
    ///
    /// Returns `true` if the attempt was admitted (and is now recorded).
    pub fn try_acquire(&self, channel: &str, now_ms: i64) -> bool {
        let mut records = self.lock();
        if !self.admits(records.get(channel).copied(), now_ms) {
            return false;
        }
        records.insert(channel.to_string(), now_ms);
        true
    }

    /// Last recorded attempt on `channel`, in epoch milliseconds.
    pub fn last_attempt(&self, channel: &str) -> Option<i64> {
        self.lock().get(channel).copied()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, i64>> {
        // The map holds plain timestamps; a poisoned lock leaves it consistent.
        self.last_attempt
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_REAUTH_COOLDOWN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_attempt_allowed() {
        let limiter = RateLimiter::default();
        assert!(limiter.should_attempt("matrix", 0));
        assert!(limiter.should_attempt("matrix", 1_700_000_000_000));
        assert_eq!(limiter.last_attempt("matrix"), None);
    }

    #[test]
    fn test_cooldown_boundary() {
        let limiter = RateLimiter::default();
        limiter.record_attempt("matrix", 100_000);

        assert!(!limiter.should_attempt("matrix", 100_000));
        assert!(!limiter.should_attempt("matrix", 129_999));
        assert!(limiter.should_attempt("matrix", 130_000));
        assert!(limiter.should_attempt("matrix", 170_000));
    }

    #[test]
    fn test_record_overwrites() {
        let limiter = RateLimiter::default();
        limiter.record_attempt("matrix", 10);
        limiter.record_attempt("matrix", 5);
        assert_eq!(limiter.last_attempt("matrix"), Some(5));
    }

    #[test]
    fn test_channels_are_independent() {
        let limiter = RateLimiter::default();
        limiter.record_attempt("matrix", 1_000);
        assert!(!limiter.should_attempt("matrix", 2_000));
        assert!(limiter.should_attempt("telegram", 2_000));
    }

    #[test]
    fn test_try_acquire() {
        let limiter = RateLimiter::new(Duration::from_millis(30_000));
        assert!(limiter.try_acquire("matrix", 0));
        assert!(!limiter.try_acquire("matrix", 5_000));
        assert_eq!(limiter.last_attempt("matrix"), Some(0));
        assert!(limiter.try_acquire("matrix", 40_000));
        assert_eq!(limiter.last_attempt("matrix"), Some(40_000));
    }

    #[test]
    fn test_custom_cooldown() {
        let limiter = RateLimiter::new(Duration::from_secs(1));
        assert_eq!(limiter.cooldown(), Duration::from_secs(1));
        limiter.record_attempt("matrix", 0);
        assert!(limiter.should_attempt("matrix", 1_000));
    }
}
