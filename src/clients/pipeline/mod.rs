//! The request pipeline.
//!
//! A [`Pipeline`] is an ordered list of [`Policy`] objects in front of a
//! [`Transport`]. Each policy receives the request and a [`Next`] handle to
//! the rest of the chain, so it can act before dispatch, after the response,
//! or short-circuit entirely.
//!
//! The standard order, outermost first:
//!
//! 1. [`RequestIdPolicy`] tags the request with `X-Request-ID`
//! 2. [`AuthPolicy`] attaches the bearer token
//! 3. [`CachePolicy`] serves fresh GET responses from memory
//! 4. [`RetryPolicy`] retries transient server failures
//! 5. [`LoadingPolicy`] counts in-flight requests
//! 6. [`ErrorNormalizationPolicy`] turns failures into [`ApiError`] records
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sales_api::clients::pipeline::{LoadingState, Pipeline, ResponseCache};
//! use sales_api::clients::ReqwestTransport;
//! use sales_api::{ApiConfig, BaseUrl, InMemoryCredentialStore};
//!
//! let config = ApiConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com/v1").unwrap())
//!     .build()
//!     .unwrap();
//! let transport = Arc::new(ReqwestTransport::new(&config).unwrap());
//! let pipeline = Pipeline::standard(
//!     &config,
//!     Arc::new(InMemoryCredentialStore::new()),
//!     Arc::new(ResponseCache::new(config.cache_ttl())),
//!     LoadingState::new(),
//!     transport,
//! );
//!
//! assert_eq!(
//!     pipeline.policy_names(),
//!     vec!["request-id", "auth", "cache", "retry", "loading", "error-normalization"]
//! );
//! ```

mod auth;
mod cache;
mod loading;
mod normalize;
mod request_id;
mod retry;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::auth::CredentialStore;
use crate::clients::errors::ApiError;
use crate::clients::http_request::HttpRequest;
use crate::clients::http_response::HttpResponse;
use crate::clients::normalizer;
use crate::clients::transport::Transport;
use crate::config::ApiConfig;

pub use auth::AuthPolicy;
pub use cache::{CachePolicy, ResponseCache};
pub use loading::{LoadingGuard, LoadingPolicy, LoadingState};
pub use normalize::ErrorNormalizationPolicy;
pub use request_id::{generate_request_id, RequestIdPolicy, REQUEST_ID_HEADER};
pub use retry::RetryPolicy;

/// One cross-cutting concern applied to every request/response pair.
#[async_trait]
pub trait Policy: Send + Sync + fmt::Debug {
    /// Short name used in logs and for order assertions.
    fn name(&self) -> &'static str;

    /// Handles the request, usually by delegating to `next`.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] produced further down the chain, or one of
    /// the policy's own.
    async fn handle(&self, request: HttpRequest, next: Next<'_>)
        -> Result<HttpResponse, ApiError>;
}

/// The remainder of the chain after the current policy.
///
/// `Next` is `Copy`, so a policy may run the remainder more than once.
#[derive(Clone, Copy, Debug)]
pub struct Next<'a> {
    policies: &'a [Arc<dyn Policy>],
    transport: &'a dyn Transport,
}

impl Next<'_> {
    /// Runs the rest of the chain.
    ///
    /// When no policy is left the request goes to the transport; a transport
    /// failure is normalized here so that every policy only ever sees
    /// [`ApiError`].
    ///
    /// # Errors
    ///
    /// Returns the first [`ApiError`] produced down the chain.
    pub async fn run(self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        match self.policies.split_first() {
            Some((policy, rest)) => {
                let next = Next {
                    policies: rest,
                    transport: self.transport,
                };
                policy.handle(request, next).await
            }
            None => self
                .transport
                .send(request)
                .await
                .map_err(|e| normalizer::normalize_transport(&e)),
        }
    }
}

/// An ordered chain of policies in front of a transport.
#[derive(Clone, Debug)]
pub struct Pipeline {
    policies: Vec<Arc<dyn Policy>>,
    transport: Arc<dyn Transport>,
}

// Verify Pipeline is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Pipeline>();
};

impl Pipeline {
    /// Creates a pipeline with no policies.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            policies: Vec::new(),
            transport,
        }
    }

    /// Appends a policy; it runs inside every policy added before it.
    #[must_use]
    pub fn with_policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policies.push(Arc::new(policy));
        self
    }

    /// Builds the standard chain in the fixed order.
    #[must_use]
    pub fn standard(
        config: &ApiConfig,
        credentials: Arc<dyn CredentialStore>,
        cache: Arc<ResponseCache>,
        loading: LoadingState,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::new(transport)
            .with_policy(RequestIdPolicy)
            .with_policy(AuthPolicy::new(credentials, config.login_path_pattern()))
            .with_policy(CachePolicy::new(cache))
            .with_policy(RetryPolicy::new(config.retry().clone()))
            .with_policy(LoadingPolicy::new(loading))
            .with_policy(ErrorNormalizationPolicy)
    }

    /// Returns the policy names, outermost first.
    #[must_use]
    pub fn policy_names(&self) -> Vec<&'static str> {
        self.policies.iter().map(|p| p.name()).collect()
    }

    /// Runs a request through the whole chain.
    ///
    /// # Errors
    ///
    /// Returns the [`ApiError`] produced by the chain.
    pub async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let next = Next {
            policies: &self.policies,
            transport: self.transport.as_ref(),
        };
        next.run(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::errors::TransportError;
    use crate::clients::http_request::HttpMethod;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RecordingTransport {
        seen: Mutex<Vec<HttpRequest>>,
    }

    #[async_trait]
    impl Transport for RecordingTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
            self.seen.lock().unwrap().push(request);
            Ok(HttpResponse::new(200, HashMap::new(), json!({"ok": true})))
        }
    }

    #[derive(Debug)]
    struct Tag(&'static str, Arc<Mutex<Vec<String>>>);

    #[async_trait]
    impl Policy for Tag {
        fn name(&self) -> &'static str {
            self.0
        }

        async fn handle(
            &self,
            request: HttpRequest,
            next: Next<'_>,
        ) -> Result<HttpResponse, ApiError> {
            self.1.lock().unwrap().push(format!("{}:in", self.0));
            let result = next.run(request).await;
            self.1.lock().unwrap().push(format!("{}:out", self.0));
            result
        }
    }

    fn get() -> HttpRequest {
        HttpRequest::builder(HttpMethod::Get, "https://api.example.com/v1/Customer")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_policies_wrap_in_insertion_order() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Pipeline::new(Arc::new(RecordingTransport::default()))
            .with_policy(Tag("outer", trace.clone()))
            .with_policy(Tag("inner", trace.clone()));

        pipeline.execute(get()).await.unwrap();

        assert_eq!(
            *trace.lock().unwrap(),
            vec!["outer:in", "inner:in", "inner:out", "outer:out"]
        );
    }

    #[tokio::test]
    async fn test_empty_pipeline_goes_straight_to_transport() {
        let transport = Arc::new(RecordingTransport::default());
        let pipeline = Pipeline::new(transport.clone());

        let response = pipeline.execute(get()).await.unwrap();

        assert_eq!(response.code, 200);
        assert_eq!(transport.seen.lock().unwrap().len(), 1);
    }
}
