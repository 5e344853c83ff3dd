//! Generic remote-resource store.
//!
//! A [`ResourceStore`] owns the state of one resource slice (one endpoint),
//! fetches it through an injected fetcher and publishes every state change on
//! a `watch` channel. Responses are ordered by a per-store sequence number so
//! only the most recently issued fetch can settle the state.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::ApiError;

type Fetcher<T, P> = Arc<dyn Fn(P) -> BoxFuture<'static, Result<T, ApiError>> + Send + Sync>;

/// Observable state of a resource slice.
///
/// While `loading` is true, `data` and `error` still describe the previous
/// settled result. A failed fetch sets `error` and leaves `data` alone.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceState<T> {
    pub data: Option<T>,
    pub loading: bool,
    pub error: Option<String>,
    /// A mutation is in flight.
    pub submitting: bool,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            data: None,
            loading: false,
            error: None,
            submitting: false,
        }
    }
}

/// Coarse lifecycle position of a [`ResourceState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Settled,
    Failed,
}

impl<T> ResourceState<T> {
    #[must_use]
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Failed
        } else if self.data.is_some() {
            Phase::Settled
        } else {
            Phase::Idle
        }
    }
}

struct Inner<T, P> {
    name: &'static str,
    fetcher: Fetcher<T, P>,
    state: watch::Sender<ResourceState<T>>,
    seq: AtomicU64,
    last_params: parking_lot::Mutex<P>,
    write_lock: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
}

/// Keeps `submitting` set for its lifetime, including when the mutation
/// future is dropped part way.
struct Submitting<'a, T>(&'a watch::Sender<ResourceState<T>>);

impl<'a, T> Submitting<'a, T> {
    fn start(state: &'a watch::Sender<ResourceState<T>>) -> Self {
        state.send_modify(|s| s.submitting = true);
        Self(state)
    }
}

impl<T> Drop for Submitting<'_, T> {
    fn drop(&mut self) {
        self.0.send_modify(|s| s.submitting = false);
    }
}

/// Store for one remote resource with parameters `P` and payload `T`.
///
/// Cloning is cheap and yields a handle to the same store.
pub struct ResourceStore<T, P> {
    inner: Arc<Inner<T, P>>,
}

impl<T, P> Clone for ResourceStore<T, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T, P> std::fmt::Debug for ResourceStore<T, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourceStore")
            .field("name", &self.inner.name)
            .field("seq", &self.inner.seq.load(Ordering::Relaxed))
            .field("closed", &self.inner.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl<T, P> ResourceStore<T, P>
where
    T: Clone + Send + Sync + 'static,
    P: Clone + Send + 'static,
{
    /// Create an idle store. Nothing is fetched until [`fetch`](Self::fetch)
    /// or [`refetch`](Self::refetch) is called.
    #[must_use]
    pub fn new<F, Fut>(name: &'static str, initial_params: P, fetcher: F) -> Self
    where
        F: Fn(P) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        Self {
            inner: Arc::new(Inner {
                name,
                fetcher: Arc::new(move |params| fetcher(params).boxed()),
                state: watch::Sender::new(ResourceState::default()),
                seq: AtomicU64::new(0),
                last_params: parking_lot::Mutex::new(initial_params),
                write_lock: tokio::sync::Mutex::new(()),
                cancel: CancellationToken::new(),
            }),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Fetch with `params` and settle the state.
    ///
    /// Errors are not returned: they land in [`ResourceState::error`]. If a
    /// newer fetch was issued meanwhile, or the store was closed, the result
    /// is dropped.
    pub async fn fetch(&self, params: P) {
        let inner = &*self.inner;
        if inner.cancel.is_cancelled() {
            return;
        }

        *inner.last_params.lock() = params.clone();
        let seq = inner.seq.fetch_add(1, Ordering::SeqCst) + 1;
        inner.state.send_modify(|s| s.loading = true);

        let request = (inner.fetcher)(params);
        let result = tokio::select! {
            () = inner.cancel.cancelled() => {
                tracing::debug!(store = inner.name, seq, "store closed; fetch abandoned");
                inner.state.send_modify(|s| s.loading = false);
                return;
            }
            result = request => result,
        };

        inner.state.send_if_modified(|state| {
            if inner.cancel.is_cancelled() {
                return std::mem::replace(&mut state.loading, false);
            }
            let latest = inner.seq.load(Ordering::SeqCst);
            if latest != seq {
                tracing::debug!(store = inner.name, seq, latest, "discarding stale response");
                return false;
            }
            match result {
                Ok(data) => {
                    state.data = Some(data);
                    state.error = None;
                }
                Err(err) => {
                    tracing::warn!(store = inner.name, error = %err, "fetch failed");
                    state.error = Some(err.to_string());
                }
            }
            state.loading = false;
            true
        });
    }

    /// Fetch again with the most recently used parameters.
    pub async fn refetch(&self) {
        let params = self.params();
        self.fetch(params).await;
    }

    /// Run a write operation against the resource.
    ///
    /// Mutations on the same store run one at a time. On success the store is
    /// refetched with its last parameters before this returns; on failure the
    /// error goes back to the caller and the state's `data` is untouched.
    ///
    /// # Errors
    /// Whatever `op` returns, or [`ApiError::Closed`] after [`close`](Self::close).
    pub async fn mutate<R, F, Fut>(&self, op: F) -> Result<R, ApiError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<R, ApiError>>,
    {
        let _guard = self.inner.write_lock.lock().await;
        if self.is_closed() {
            return Err(ApiError::Closed);
        }

        let _submitting = Submitting::start(&self.inner.state);
        let result = op().await;
        if result.is_ok() {
            self.refetch().await;
        }
        result
    }

    /// Parameters of the most recent fetch (or the initial ones).
    #[must_use]
    pub fn params(&self) -> P {
        self.inner.last_params.lock().clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> ResourceState<T> {
        self.inner.state.borrow().clone()
    }

    /// Receiver that observes every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.inner.state.subscribe()
    }

    /// Cancel in-flight fetches and refuse further work.
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }
}
