//! Registry of cancelable in-flight requests and open streams.

use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use uuid::Uuid;

use crate::error::CleanupError;

/// Something that can be cancelled or closed once.
pub trait Cancel: Send {
    /// Cancel the operation. Failures are reported but never retried.
    fn cancel(self: Box<Self>) -> Result<(), CleanupError>;
}

impl Cancel for futures::future::AbortHandle {
    fn cancel(self: Box<Self>) -> Result<(), CleanupError> {
        self.abort();
        Ok(())
    }
}

impl Cancel for tokio::task::AbortHandle {
    fn cancel(self: Box<Self>) -> Result<(), CleanupError> {
        self.abort();
        Ok(())
    }
}

impl Cancel for tokio::sync::oneshot::Sender<()> {
    fn cancel(self: Box<Self>) -> Result<(), CleanupError> {
        self.send(()).map_err(|_| CleanupError::AlreadyCompleted)
    }
}

/// [`Cancel`] implementation backed by a closure. See [`cancel_fn`].
pub struct FnCancel<F>(F);

impl<F> Cancel for FnCancel<F>
where
    F: FnOnce() -> Result<(), CleanupError> + Send,
{
    fn cancel(self: Box<Self>) -> Result<(), CleanupError> {
        (self.0)()
    }
}

/// Wrap a closure as a registry entry.
pub fn cancel_fn<F>(f: F) -> FnCancel<F>
where
    F: FnOnce() -> Result<(), CleanupError> + Send,
{
    FnCancel(f)
}

/// Handle identifying a registry entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(Uuid);

impl EntryId {
    fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which collection an entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Request,
    Stream,
}

#[derive(Default)]
struct Entries {
    requests: HashMap<EntryId, Box<dyn Cancel>>,
    streams: HashMap<EntryId, Box<dyn Cancel>>,
}

impl Entries {
    fn set_mut(&mut self, kind: EntryKind) -> &mut HashMap<EntryId, Box<dyn Cancel>> {
        match kind {
            EntryKind::Request => &mut self.requests,
            EntryKind::Stream => &mut self.streams,
        }
    }
}

/// Outcome of a [`CancelRegistry::cleanup`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Pending requests whose cancel succeeded
    pub requests_cancelled: usize,
    /// Open streams whose close succeeded
    pub streams_closed: usize,
    /// Entries whose cancel/close failed (and were dropped anyway)
    pub failures: usize,
}

impl CleanupReport {
    /// Total entries removed by the pass.
    pub fn total(&self) -> usize {
        self.requests_cancelled + self.streams_closed + self.failures
    }
}

/// Process-wide bookkeeping of cancelable operations.
///
/// Creation sites register an entry and keep the returned
/// [`RegistrationGuard`]; dropping the guard marks the operation complete and
/// removes the entry. A global cleanup cancels and removes everything.
///
/// Cloning shares the same registry.
#[derive(Clone, Default)]
pub struct CancelRegistry {
    inner: Arc<Mutex<Entries>>,
}

impl CancelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track an in-flight request.
    pub fn register_request(&self, entry: impl Cancel + 'static) -> RegistrationGuard {
        self.register(EntryKind::Request, Box::new(entry))
    }

    /// Track an open streaming connection.
    pub fn register_stream(&self, entry: impl Cancel + 'static) -> RegistrationGuard {
        self.register(EntryKind::Stream, Box::new(entry))
    }

    fn register(&self, kind: EntryKind, entry: Box<dyn Cancel>) -> RegistrationGuard {
        let id = EntryId::generate();
        lock(&self.inner).set_mut(kind).insert(id, entry);
        RegistrationGuard {
            id,
            kind,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Number of tracked in-flight requests.
    pub fn pending_requests(&self) -> usize {
        lock(&self.inner).requests.len()
    }

    /// Number of tracked open streams.
    pub fn open_streams(&self) -> usize {
        lock(&self.inner).streams.len()
    }

    pub fn is_empty(&self) -> bool {
        let entries = lock(&self.inner);
        entries.requests.is_empty() && entries.streams.is_empty()
    }

    /// Cancel every pending request, then close every open stream.
    ///
    /// Best effort: individual failures are logged at debug level and do not
    /// stop the pass. Both collections are empty afterwards.
    pub fn cleanup(&self) -> CleanupReport {
        let (requests, streams) = {
            let mut entries = lock(&self.inner);
            (
                std::mem::take(&mut entries.requests),
                std::mem::take(&mut entries.streams),
            )
        };

        let mut report = CleanupReport::default();

        for (id, entry) in requests {
            if run_cancel(id, EntryKind::Request, entry) {
                report.requests_cancelled += 1;
            } else {
                report.failures += 1;
            }
        }

        for (id, entry) in streams {
            if run_cancel(id, EntryKind::Stream, entry) {
                report.streams_closed += 1;
            } else {
                report.failures += 1;
            }
        }

        if report.total() > 0 {
            tracing::info!(
                requests = report.requests_cancelled,
                streams = report.streams_closed,
                failures = report.failures,
                "global cleanup finished"
            );
        }

        report
    }
}

impl fmt::Debug for CancelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelRegistry")
            .field("pending_requests", &self.pending_requests())
            .field("open_streams", &self.open_streams())
            .finish()
    }
}

fn run_cancel(id: EntryId, kind: EntryKind, entry: Box<dyn Cancel>) -> bool {
    match catch_unwind(AssertUnwindSafe(move || entry.cancel())) {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            tracing::debug!(%id, ?kind, error = %e, "cleanup entry failed");
            false
        }
        Err(_) => {
            tracing::debug!(%id, ?kind, "cleanup entry panicked");
            false
        }
    }
}

fn lock(inner: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Keeps a registry entry alive; dropping it removes the entry.
#[must_use = "dropping the guard immediately unregisters the entry"]
#[derive(Debug)]
pub struct RegistrationGuard {
    id: EntryId,
    kind: EntryKind,
    registry: Weak<Mutex<Entries>>,
}

impl RegistrationGuard {
    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }
}

impl Drop for RegistrationGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            lock(&inner).set_mut(self.kind).remove(&self.id);
        }
    }
}
