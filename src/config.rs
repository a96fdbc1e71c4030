//! Watchdog configuration.
//!
//! Defaults match production. Overrides come from a JSON file, from
//! `DAILYFIX_*` environment variables, or from the builder methods.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::traits::NotificationOptions;
use crate::watchdog::{ResponseClassifier, TargetMatcher};

/// Env var overriding the re-auth cooldown (milliseconds).
pub const ENV_REAUTH_COOLDOWN_MS: &str = "DAILYFIX_REAUTH_COOLDOWN_MS";
/// Env var overriding the delay before sign-out (milliseconds).
pub const ENV_SIGNOUT_DELAY_MS: &str = "DAILYFIX_SIGNOUT_DELAY_MS";
/// Env var overriding the login path.
pub const ENV_LOGIN_PATH: &str = "DAILYFIX_LOGIN_PATH";
/// Env var overriding the bridge channel name.
pub const ENV_BRIDGE_CHANNEL: &str = "DAILYFIX_BRIDGE_CHANNEL";

/// Tunables for the session watchdog.
///
/// # Example
///
/// ```ignore
/// use dailyfix_watchdog::config::WatchdogConfig;
///
/// let config = WatchdogConfig::default()
///     .with_signout_delay(Duration::from_millis(500))
///     .with_login_path("/signin");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchdogConfig {
    /// Minimum gap between re-auth requests on one channel (default: 30000)
    pub reauth_cooldown_ms: u64,
    /// Delay between the expiry notification and sign-out (default: 2000)
    pub signout_delay_ms: u64,
    /// How the identity provider's auth endpoint is recognised
    pub primary_matcher: TargetMatcher,
    /// How the chat bridge is recognised
    pub bridge_matcher: TargetMatcher,
    /// Channel name used for bridge re-auth requests (default: "matrix")
    pub bridge_channel: String,
    /// Where to send the user after expiry (default: "/login")
    pub login_path: String,
    /// How long the expiry notification stays visible (default: 4000)
    pub notification_duration_ms: u64,
}

impl Default for WatchdogConfig {
    fn default() -> Self {
        Self {
            reauth_cooldown_ms: 30_000,
            signout_delay_ms: 2_000,
            primary_matcher: TargetMatcher::segment("auth"),
            bridge_matcher: TargetMatcher::segment("matrix"),
            bridge_channel: "matrix".to_string(),
            login_path: "/login".to_string(),
            notification_duration_ms: 4_000,
        }
    }
}

impl WatchdogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Load from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `DAILYFIX_*` overrides from the process environment.
    pub fn apply_env(mut self) -> Result<Self, ConfigError> {
        if let Some(ms) = env_millis(ENV_REAUTH_COOLDOWN_MS)? {
            self.reauth_cooldown_ms = ms;
        }
        if let Some(ms) = env_millis(ENV_SIGNOUT_DELAY_MS)? {
            self.signout_delay_ms = ms;
        }
        if let Some(path) = env_nonempty(ENV_LOGIN_PATH) {
            self.login_path = path;
        }
        if let Some(channel) = env_nonempty(ENV_BRIDGE_CHANNEL) {
            self.bridge_channel = channel;
        }
        Ok(self)
    }

    pub fn with_reauth_cooldown(mut self, cooldown: Duration) -> Self {
        self.reauth_cooldown_ms = cooldown.as_millis() as u64;
        self
    }

    pub fn with_signout_delay(mut self, delay: Duration) -> Self {
        self.signout_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_primary_matcher(mut self, matcher: TargetMatcher) -> Self {
        self.primary_matcher = matcher;
        self
    }

    pub fn with_bridge_matcher(mut self, matcher: TargetMatcher) -> Self {
        self.bridge_matcher = matcher;
        self
    }

    pub fn with_bridge_channel(mut self, channel: impl Into<String>) -> Self {
        self.bridge_channel = channel.into();
        self
    }

    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    pub fn reauth_cooldown(&self) -> Duration {
        Duration::from_millis(self.reauth_cooldown_ms)
    }

    pub fn signout_delay(&self) -> Duration {
        Duration::from_millis(self.signout_delay_ms)
    }

    /// Notification options for the expiry message.
    pub fn notification_options(&self) -> NotificationOptions {
        NotificationOptions::with_duration(Duration::from_millis(self.notification_duration_ms))
            .with_id("session-expired")
    }

    /// Build the response classifier described by this config.
    pub fn classifier(&self) -> ResponseClassifier {
        ResponseClassifier::new(
            self.primary_matcher.clone(),
            self.bridge_matcher.clone(),
            self.bridge_channel.clone(),
        )
    }
}

fn env_nonempty(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_millis(var: &str) -> Result<Option<u64>, ConfigError> {
    match env_nonempty(var) {
        None => Ok(None),
        Some(value) => value
            .parse::<u64>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                var: var.to_string(),
                value,
            }),
    }
}
