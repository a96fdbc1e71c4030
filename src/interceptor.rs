//! Response interception on top of an [`HttpClient`].
//!
//! [`InterceptingClient`] wraps any client and reports every resolved response
//! to its registered [`ResponseInterceptor`]s. Registration returns an
//! [`InterceptorHandle`]; dropping or removing the handle reverses it.
//!
//! Interceptors are a side channel. The wrapped call's result is returned to
//! the caller unchanged, whatever the interceptors do, including panicking.

use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

use async_trait::async_trait;
use futures::future::{AbortHandle, Abortable};
use futures::{Future, StreamExt};

use crate::cleanup::CancelRegistry;
use crate::traits::{ByteStream, Headers, HttpClient, HttpError, Response};

/// Observer of resolved responses.
pub trait ResponseInterceptor: Send + Sync {
    /// Called once per resolved response, in resolution order.
    ///
    /// Streaming responses are reported when the stream opens, with
    /// [`STREAM_OPENED_STATUS`] on success. Network-level failures never
    /// reach this method.
    fn on_response(&self, target: &str, status: u16);
}

/// Status reported to interceptors for a successfully opened stream.
///
/// The byte stream does not expose the exact 2xx code.
pub const STREAM_OPENED_STATUS: u16 = 200;

struct Registered {
    id: u64,
    slot: Option<&'static str>,
    interceptor: Arc<dyn ResponseInterceptor>,
}

type InterceptorList = RwLock<Vec<Registered>>;

/// HTTP client wrapper that feeds resolved responses to interceptors.
///
/// With [`with_registry`](Self::with_registry), each in-flight request is
/// tracked as a pending request and each streaming body as an open stream, so
/// a global cleanup cancels them. A cancelled request resolves to
/// [`HttpError::Cancelled`].
pub struct InterceptingClient<C> {
    inner: C,
    interceptors: Arc<InterceptorList>,
    next_id: Arc<AtomicU64>,
    registry: Option<CancelRegistry>,
}

impl<C: HttpClient> InterceptingClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            interceptors: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            registry: None,
        }
    }

    /// Track requests and streams in `registry`.
    pub fn with_registry(mut self, registry: CancelRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    pub fn registry(&self) -> Option<&CancelRegistry> {
        self.registry.as_ref()
    }

    /// Number of registered interceptors.
    pub fn interceptor_count(&self) -> usize {
        read(&self.interceptors).len()
    }

    /// Register an interceptor.
    pub fn register(&self, interceptor: Arc<dyn ResponseInterceptor>) -> InterceptorHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        write(&self.interceptors).push(Registered {
            id,
            slot: None,
            interceptor,
        });
        self.handle(id)
    }

    /// Register an interceptor under an exclusive `slot` name.
    ///
    /// Returns `None` if another interceptor currently holds the slot.
    pub fn register_exclusive(
        &self,
        slot: &'static str,
        interceptor: Arc<dyn ResponseInterceptor>,
    ) -> Option<InterceptorHandle> {
        let mut list = write(&self.interceptors);
        if list.iter().any(|r| r.slot == Some(slot)) {
            return None;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        list.push(Registered {
            id,
            slot: Some(slot),
            interceptor,
        });
        drop(list);
        Some(self.handle(id))
    }

    /// Whether some interceptor holds `slot`.
    pub fn is_slot_taken(&self, slot: &str) -> bool {
        read(&self.interceptors).iter().any(|r| r.slot == Some(slot))
    }

    fn handle(&self, id: u64) -> InterceptorHandle {
        InterceptorHandle {
            id,
            interceptors: Arc::downgrade(&self.interceptors),
        }
    }

    fn notify(&self, target: &str, status: u16) {
        let snapshot: Vec<Arc<dyn ResponseInterceptor>> = read(&self.interceptors)
            .iter()
            .map(|r| Arc::clone(&r.interceptor))
            .collect();

        for interceptor in snapshot {
            let outcome = catch_unwind(AssertUnwindSafe(|| interceptor.on_response(target, status)));
            if outcome.is_err() {
                tracing::error!(target_url = %target, status, "response interceptor panicked");
            }
        }
    }

    async fn tracked<T, F>(&self, fut: F) -> Result<T, HttpError>
    where
        F: Future<Output = Result<T, HttpError>>,
    {
        let Some(registry) = &self.registry else {
            return fut.await;
        };

        let (handle, reg) = AbortHandle::new_pair();
        let _guard = registry.register_request(handle);
        match Abortable::new(fut, reg).await {
            Ok(result) => result,
            Err(_aborted) => Err(HttpError::Cancelled),
        }
    }

    fn observe(&self, target: &str, result: &Result<Response, HttpError>) {
        if let Ok(response) = result {
            self.notify(target, response.status);
        }
    }
}

impl<C> fmt::Debug for InterceptingClient<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptingClient")
            .field("interceptors", &read(&self.interceptors).len())
            .field("tracks_requests", &self.registry.is_some())
            .finish()
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for InterceptingClient<C> {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        let result = self.tracked(self.inner.get(url, headers)).await;
        self.observe(url, &result);
        result
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        let result = self.tracked(self.inner.post(url, body, headers)).await;
        self.observe(url, &result);
        result
    }

    async fn post_stream(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<ByteStream, HttpError> {
        let result = self.tracked(self.inner.post_stream(url, body, headers)).await;

        // An opened stream is a resolved 2xx answer; a non-2xx answer arrives
        // as ServerError. Network failures carry no status.
        match &result {
            Ok(_) => self.notify(url, STREAM_OPENED_STATUS),
            Err(err) => {
                if let Some(status) = err.status() {
                    self.notify(url, status);
                }
            }
        }

        let stream = result?;
        let Some(registry) = &self.registry else {
            return Ok(stream);
        };

        let (handle, reg) = AbortHandle::new_pair();
        let guard = registry.register_stream(handle);
        let stream = Abortable::new(stream, reg).map(move |chunk| {
            let _ = &guard;
            chunk
        });
        Ok(Box::pin(stream))
    }
}

/// Keeps an interceptor registered; dropping it unregisters.
#[must_use = "dropping the handle immediately unregisters the interceptor"]
pub struct InterceptorHandle {
    id: u64,
    interceptors: Weak<InterceptorList>,
}

impl InterceptorHandle {
    /// Whether the interceptor is still registered.
    pub fn is_registered(&self) -> bool {
        self.interceptors
            .upgrade()
            .map(|list| read(&list).iter().any(|r| r.id == self.id))
            .unwrap_or(false)
    }

    /// Unregister now.
    pub fn remove(self) {
        drop(self);
    }
}

impl Drop for InterceptorHandle {
    fn drop(&mut self) {
        if let Some(list) = self.interceptors.upgrade() {
            write(&list).retain(|r| r.id != self.id);
        }
    }
}

impl fmt::Debug for InterceptorHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterceptorHandle")
            .field("id", &self.id)
            .finish()
    }
}

fn read(list: &InterceptorList) -> std::sync::RwLockReadGuard<'_, Vec<Registered>> {
    list.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(list: &InterceptorList) -> std::sync::RwLockWriteGuard<'_, Vec<Registered>> {
    list.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
