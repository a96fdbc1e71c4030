//! Response classification.
//!
//! The identity provider and the chat bridge have independent auth
//! lifecycles, so a 403 from one must never log the user out of the other.

use super::matcher::{parse_target, TargetMatcher};

/// What a resolved response means for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Nothing to do.
    Ignore,
    /// The primary (identity-provider) session is gone.
    PrimarySessionExpired,
    /// A secondary backend rejected our credentials.
    SecondarySessionError { channel: String },
}

impl Classification {
    /// Short label for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Ignore => "ignore",
            Classification::PrimarySessionExpired => "primary_session_expired",
            Classification::SecondarySessionError { .. } => "secondary_session_error",
        }
    }
}

/// Maps `(target, status)` pairs to a [`Classification`].
#[derive(Debug, Clone)]
pub struct ResponseClassifier {
    primary: TargetMatcher,
    bridge: TargetMatcher,
    bridge_channel: String,
}

impl ResponseClassifier {
    pub fn new(
        primary: TargetMatcher,
        bridge: TargetMatcher,
        bridge_channel: impl Into<String>,
    ) -> Self {
        Self {
            primary,
            bridge,
            bridge_channel: bridge_channel.into(),
        }
    }

    /// Name of the bridge channel reported in secondary errors.
    pub fn bridge_channel(&self) -> &str {
        &self.bridge_channel
    }

    /// Classify a resolved response. First matching rule wins:
    ///
    /// 1. primary auth target, status 403, not a bridge target: primary expired
    /// 2. bridge target, status 401 or 403: secondary error on the bridge channel
    /// 3. anything else, including malformed targets: ignore
    pub fn classify(&self, target: &str, status: u16) -> Classification {
        let Some(url) = parse_target(target) else {
            return Classification::Ignore;
        };

        let is_bridge = self.bridge.matches(&url, target);

        if status == 403 && !is_bridge && self.primary.matches(&url, target) {
            return Classification::PrimarySessionExpired;
        }

        if is_bridge && matches!(status, 401 | 403) {
            return Classification::SecondarySessionError {
                channel: self.bridge_channel.clone(),
            };
        }

        Classification::Ignore
    }
}

impl Default for ResponseClassifier {
    fn default() -> Self {
        Self::new(
            TargetMatcher::segment("auth"),
            TargetMatcher::segment("matrix"),
            "matrix",
        )
    }
}
