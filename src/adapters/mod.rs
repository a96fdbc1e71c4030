//! Concrete implementations of the collaborator traits.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP client using reqwest
//! - [`FileSessionStore`] - Primary session persisted as a JSON file
//! - [`TracingNotifier`] / [`LoggingNavigator`] - Headless notification and navigation
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides test doubles for every trait:
//! - [`mock::MockHttpClient`] - Configurable HTTP responses
//! - [`mock::MockSessionStore`] - Configurable sign-out outcome
//! - [`mock::MockNavigator`] / [`mock::MockNotifier`] - Record calls

pub mod console;
pub mod file_session;
pub mod mock;
pub mod reqwest_http;

pub use console::{LoggingNavigator, TracingNotifier};
pub use file_session::{FileSessionStore, StoredSession};
pub use mock::{MockHttpClient, MockNavigator, MockNotifier, MockSessionStore};
pub use reqwest_http::ReqwestHttpClient;
