use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::watch;

use super::{Next, Policy};
use crate::clients::errors::ApiError;
use crate::clients::http_request::HttpRequest;
use crate::clients::http_response::HttpResponse;

#[derive(Debug)]
struct LoadingInner {
    in_flight: Mutex<usize>,
    loading: watch::Sender<bool>,
}

/// Shared in-flight request counter.
///
/// The state is "loading" while the counter is above zero. Subscribers are
/// notified on the 0 → 1 and 1 → 0 transitions only.
#[derive(Clone, Debug)]
pub struct LoadingState {
    inner: Arc<LoadingInner>,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadingState {
    /// Creates an idle state.
    #[must_use]
    pub fn new() -> Self {
        let (loading, _) = watch::channel(false);
        Self {
            inner: Arc::new(LoadingInner {
                in_flight: Mutex::new(0),
                loading,
            }),
        }
    }

    /// Returns the number of requests currently in flight.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        *self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` while at least one request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.in_flight() > 0
    }

    /// Subscribes to loading transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    /// Marks one request as started. The returned guard marks it finished
    /// when dropped, including when the request future is cancelled.
    #[must_use]
    pub fn begin(&self) -> LoadingGuard {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *in_flight += 1;
        if *in_flight == 1 {
            self.inner.loading.send_replace(true);
        }
        LoadingGuard {
            state: self.clone(),
        }
    }

    fn end(&self) {
        let mut in_flight = self
            .inner
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *in_flight = in_flight.saturating_sub(1);
        if *in_flight == 0 {
            self.inner.loading.send_replace(false);
        }
    }
}

/// Scoped in-flight marker returned by [`LoadingState::begin`].
#[derive(Debug)]
pub struct LoadingGuard {
    state: LoadingState,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.state.end();
    }
}

/// Counts each dispatch in a [`LoadingState`].
#[derive(Clone, Debug)]
pub struct LoadingPolicy {
    state: LoadingState,
}

impl LoadingPolicy {
    /// Creates the policy over a shared state.
    #[must_use]
    pub const fn new(state: LoadingState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Policy for LoadingPolicy {
    fn name(&self) -> &'static str {
        "loading"
    }

    async fn handle(&self, request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, ApiError> {
        let _guard = self.state.begin();
        next.run(request).await
    }
}
