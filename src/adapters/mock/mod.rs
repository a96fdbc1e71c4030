//! Mock implementations for testing.
//!
//! Test doubles for every collaborator trait, so the watchdog can be driven
//! without a network, a session backend, or a UI.
//!
//! # Available Mocks
//!
//! - [`MockHttpClient`] - HTTP client with configurable responses
//! - [`MockSessionStore`] - Session store with configurable sign-out outcome
//! - [`MockNavigator`] - Records redirects
//! - [`MockNotifier`] - Records notifications

pub mod http;
pub mod navigation;
pub mod notification;
pub mod session;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
pub use navigation::MockNavigator;
pub use notification::MockNotifier;
pub use session::MockSessionStore;
