//! Request target matching.
//!
//! Targets are parsed as URLs and matched structurally. Plain substring
//! containment is available as [`TargetMatcher::Contains`] but never used by
//! default: `"matrix"` would otherwise also match `/api/v1/matrixlike/export`.

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Base used to resolve path-only targets such as `/api/v1/matrix/status`.
const RELATIVE_BASE: &str = "http://relative.invalid/";

/// Parse a request target, accepting absolute URLs and absolute paths.
///
/// Returns `None` for empty or malformed targets.
pub fn parse_target(target: &str) -> Option<Url> {
    let target = target.trim();
    if target.is_empty() {
        return None;
    }
    match Url::parse(target) {
        Ok(url) => Some(url),
        Err(_) if target.starts_with('/') && !target.starts_with("//") => {
            Url::parse(RELATIVE_BASE).ok()?.join(target).ok()
        }
        Err(_) => None,
    }
}

/// How a backend is recognised from a request target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum TargetMatcher {
    /// Some path segment equals the value exactly.
    Segment(String),
    /// The URL path starts with the value.
    PathPrefix(String),
    /// The URL host equals the value (case-insensitive).
    Host(String),
    /// The raw target contains the value anywhere.
    Contains(String),
}

impl TargetMatcher {
    /// Shorthand for [`TargetMatcher::Segment`].
    pub fn segment(name: impl Into<String>) -> Self {
        TargetMatcher::Segment(name.into())
    }

    /// Check a parsed target against this matcher.
    ///
    /// `raw` is the original target string, used only by `Contains`.
    pub fn matches(&self, url: &Url, raw: &str) -> bool {
        match self {
            TargetMatcher::Segment(name) => url
                .path_segments()
                .map(|mut segments| segments.any(|s| s == name))
                .unwrap_or(false),
            TargetMatcher::PathPrefix(prefix) => url.path().starts_with(prefix.as_str()),
            TargetMatcher::Host(host) => url
                .host_str()
                .map(|h| h.eq_ignore_ascii_case(host))
                .unwrap_or(false),
            TargetMatcher::Contains(text) => raw.contains(text.as_str()),
        }
    }
}
