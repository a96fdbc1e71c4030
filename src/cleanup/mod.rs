//! Global cleanup of in-flight requests and open streams.
//!
//! ```text
//! creation sites ──register──▶ CancelRegistry ◀──cleanup()── cleanup listener
//!       │                        (requests,                        ▲
//!       └── guard drop ──remove─▶  streams)          SessionEvent::GlobalCleanup
//! ```
//!
//! Cleanup is advisory: it guarantees the bookkeeping is cleared and every
//! entry was asked to stop, not that the underlying work actually stopped.

mod listener;
mod registry;

pub use listener::spawn_cleanup_listener;
pub use registry::{
    cancel_fn, Cancel, CancelRegistry, CleanupReport, EntryId, EntryKind, FnCancel,
    RegistrationGuard,
};
