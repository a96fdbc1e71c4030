//! Trait abstractions for the watchdog's collaborators.
//!
//! The watchdog never talks to the host application directly. Everything it
//! touches sits behind one of these traits so it can be injected and mocked.
//!
//! # Traits
//!
//! - [`HttpClient`] - HTTP client operations (GET, POST, streaming)
//! - [`AuthSessionStore`] - Primary session presence and sign-out
//! - [`NavigationService`] - Redirects to host views
//! - [`NotificationSurface`] - Transient user-facing messages

pub mod http;
pub mod navigation;
pub mod notification;
pub mod session;

pub use http::{ByteStream, Headers, HttpClient, HttpError, Response};
pub use navigation::NavigationService;
pub use notification::{NotificationOptions, NotificationSurface};
pub use session::AuthSessionStore;
