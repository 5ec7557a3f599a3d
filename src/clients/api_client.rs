//! The typed client.
//!
//! [`ApiClient`] is the single entry point for talking to the backend. Every
//! verb resolves the endpoint against the configured base URL, merges the
//! default headers with the caller's, runs the request through the standard
//! [`Pipeline`] and decodes the payload out of whichever envelope the backend
//! used. Every failure surfaces as one [`ApiError`].

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::auth::CredentialStore;
use crate::clients::errors::{ApiError, TransportError};
use crate::clients::http_request::{
    FilePart, HttpMethod, HttpRequest, HttpRequestBuilder, MultipartPayload, RequestBody,
    UploadProgress,
};
use crate::clients::http_response::{success_flag, Envelope, HttpResponse, PaginatedEnvelope};
use crate::clients::normalizer;
use crate::clients::options::{PaginationParams, RequestOptions};
use crate::clients::pipeline::{LoadingState, Pipeline, ResponseCache};
use crate::clients::transport::{ReqwestTransport, Transport};
use crate::config::ApiConfig;
use crate::resources::OrdersApi;

const JSON_CONTENT_TYPE: &str = "application/json";

/// Path of the backend health probe.
pub const HEALTH_PATH: &str = "/health";

/// Result of [`ApiClient::health_check`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Reported status, e.g. `"ok"`.
    pub status: String,
    /// Backend timestamp.
    #[serde(default)]
    pub timestamp: String,
}

/// Typed client for the sales backend.
///
/// Cloning is cheap: clones share the connection pool, the response cache
/// and the loading state.
///
/// # Thread Safety
///
/// `ApiClient` is `Send + Sync`, making it safe to share across async tasks.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use sales_api::{ApiClient, ApiConfig, BaseUrl, Endpoint, InMemoryCredentialStore};
/// use sales_api::resources::Customer;
///
/// let config = ApiConfig::builder()
///     .base_url(BaseUrl::new("https://api.example.com/v1")?)
///     .build()?;
/// let client = ApiClient::new(config, Arc::new(InMemoryCredentialStore::with_token("t0k3n")))?;
///
/// let customers: Vec<Customer> = client.get_list(Endpoint::Customer, None).await?;
/// let orders = client.orders().orders_by_customer(7).await?;
/// ```
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    config: ApiConfig,
    pipeline: Pipeline,
    cache: Arc<ResponseCache>,
    loading: LoadingState,
}

// Verify ApiClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiClient>();
};

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.config.base_url().as_ref())
            .field("policies", &self.inner.pipeline.policy_names())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Creates a client backed by the `reqwest` transport.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the HTTP client cannot be initialized.
    pub fn new(
        config: ApiConfig,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self, TransportError> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        Ok(Self::with_transport(config, credentials, transport))
    }

    /// Creates a client over a custom transport.
    #[must_use]
    pub fn with_transport(
        config: ApiConfig,
        credentials: Arc<dyn CredentialStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        let cache = Arc::new(ResponseCache::new(config.cache_ttl()));
        let loading = LoadingState::new();
        let pipeline = Pipeline::standard(
            &config,
            credentials,
            Arc::clone(&cache),
            loading.clone(),
            transport,
        );

        Self {
            inner: Arc::new(ClientInner {
                config,
                pipeline,
                cache,
                loading,
            }),
        }
    }

    /// Returns the client configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Returns the policy names of the request pipeline, outermost first.
    #[must_use]
    pub fn policy_names(&self) -> Vec<&'static str> {
        self.inner.pipeline.policy_names()
    }

    /// Access the orders API.
    #[must_use]
    pub fn orders(&self) -> OrdersApi {
        OrdersApi::new(self.clone())
    }

    /// Resolves an endpoint to an absolute URL.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use sales_api::{ApiClient, ApiConfig, BaseUrl, Endpoint, InMemoryCredentialStore};
    ///
    /// let config = ApiConfig::builder()
    ///     .base_url(BaseUrl::new("https://api.example.com/v1").unwrap())
    ///     .build()
    ///     .unwrap();
    /// let client = ApiClient::new(config, Arc::new(InMemoryCredentialStore::new())).unwrap();
    ///
    /// assert_eq!(client.url(Endpoint::Customer), "https://api.example.com/v1/Customer");
    /// assert_eq!(client.url("/Customer"), "https://api.example.com/v1/Customer");
    /// assert_eq!(client.url("https://other.example.com/x"), "https://other.example.com/x");
    /// ```
    #[must_use]
    pub fn url(&self, endpoint: impl AsRef<str>) -> String {
        self.inner.config.base_url().join(endpoint.as_ref())
    }

    // Cache and loading state

    /// Empties the response cache.
    pub fn clear_cache(&self) {
        self.inner.cache.clear();
    }

    /// Returns the number of live cache entries.
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.inner.cache.len()
    }

    /// Returns the shared loading state.
    #[must_use]
    pub fn loading(&self) -> &LoadingState {
        &self.inner.loading
    }

    /// Returns `true` while at least one request is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.inner.loading.is_loading()
    }

    /// Subscribes to loading transitions.
    #[must_use]
    pub fn subscribe_loading(&self) -> watch::Receiver<bool> {
        self.inner.loading.subscribe()
    }

    // Verbs

    /// Sends a GET request and decodes the payload strictly.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure, including a payload that cannot
    /// be decoded into `T` (`INVALID_RESPONSE`).
    pub async fn get<T: DeserializeOwned>(
        &self,
        endpoint: impl AsRef<str>,
        options: Option<RequestOptions>,
    ) -> Result<T, ApiError> {
        let url = self.url(endpoint.as_ref());
        let response = self.send(HttpMethod::Get, &url, options, None, &[]).await?;
        Self::decode(response, &url)
    }

    /// Sends a GET request for `{endpoint}/{id}`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn get_by_id<T: DeserializeOwned>(
        &self,
        endpoint: impl AsRef<str>,
        id: impl fmt::Display,
        options: Option<RequestOptions>,
    ) -> Result<T, ApiError> {
        self.get(with_id(endpoint.as_ref(), &id), options).await
    }

    /// Sends a GET request whose payload is expected to be a list.
    ///
    /// A payload of any other shape yields an empty list and a warning
    /// instead of an error.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport or HTTP failures, an unsuccessful
    /// envelope, or list items that cannot be decoded into `T`.
    pub async fn get_list<T: DeserializeOwned>(
        &self,
        endpoint: impl AsRef<str>,
        options: Option<RequestOptions>,
    ) -> Result<Vec<T>, ApiError> {
        let url = self.url(endpoint.as_ref());
        let response = self.send(HttpMethod::Get, &url, options, None, &[]).await?;
        let status = response.code;
        let payload = Self::unwrap_envelope(response, &url)?;

        if !payload.is_array() {
            tracing::warn!(
                url = %url,
                payload = %shape_of(&payload),
                "Unrecognized response payload shape, returning an empty list"
            );
            return Ok(Vec::new());
        }

        serde_json::from_value(payload).map_err(|e| Self::decode_error(status, &e, &url))
    }

    /// Sends a paginated GET request.
    ///
    /// Pagination fields override query parameters of the same name in
    /// `options`; absent fields are not sent.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn get_paginated<T: DeserializeOwned>(
        &self,
        endpoint: impl AsRef<str>,
        params: &PaginationParams,
        options: Option<RequestOptions>,
    ) -> Result<PaginatedEnvelope<T>, ApiError> {
        let url = self.url(endpoint.as_ref());
        let response = self
            .send(HttpMethod::Get, &url, options, None, &params.to_query())
            .await?;
        Self::decode(response, &url)
    }

    /// Sends a POST request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on any failure; a body that cannot be serialized
    /// yields `INVALID_REQUEST`.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: impl AsRef<str>,
        body: &B,
        options: Option<RequestOptions>,
    ) -> Result<T, ApiError> {
        self.send_json(HttpMethod::Post, endpoint.as_ref(), body, options)
            .await
    }

    /// Sends a PUT request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::post`].
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: impl AsRef<str>,
        body: &B,
        options: Option<RequestOptions>,
    ) -> Result<T, ApiError> {
        self.send_json(HttpMethod::Put, endpoint.as_ref(), body, options)
            .await
    }

    /// Sends a PUT request to `{endpoint}/{id}`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::post`].
    pub async fn put_by_id<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: impl AsRef<str>,
        id: impl fmt::Display,
        body: &B,
        options: Option<RequestOptions>,
    ) -> Result<T, ApiError> {
        self.put(with_id(endpoint.as_ref(), &id), body, options).await
    }

    /// Sends a PATCH request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::post`].
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: impl AsRef<str>,
        body: &B,
        options: Option<RequestOptions>,
    ) -> Result<T, ApiError> {
        self.send_json(HttpMethod::Patch, endpoint.as_ref(), body, options)
            .await
    }

    /// Sends a PATCH request to `{endpoint}/{id}`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::post`].
    pub async fn patch_by_id<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        endpoint: impl AsRef<str>,
        id: impl fmt::Display,
        body: &B,
        options: Option<RequestOptions>,
    ) -> Result<T, ApiError> {
        self.patch(with_id(endpoint.as_ref(), &id), body, options)
            .await
    }

    /// Sends a DELETE request, discarding the payload.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport or HTTP failures, or an
    /// unsuccessful envelope.
    pub async fn delete(
        &self,
        endpoint: impl AsRef<str>,
        options: Option<RequestOptions>,
    ) -> Result<(), ApiError> {
        let url = self.url(endpoint.as_ref());
        let response = self.send(HttpMethod::Delete, &url, options, None, &[]).await?;
        Self::unwrap_envelope(response, &url).map(drop)
    }

    /// Sends a DELETE request and decodes the payload.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn delete_as<T: DeserializeOwned>(
        &self,
        endpoint: impl AsRef<str>,
        options: Option<RequestOptions>,
    ) -> Result<T, ApiError> {
        let url = self.url(endpoint.as_ref());
        let response = self.send(HttpMethod::Delete, &url, options, None, &[]).await?;
        Self::decode(response, &url)
    }

    /// Sends a DELETE request to `{endpoint}/{id}`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::delete`].
    pub async fn delete_by_id(
        &self,
        endpoint: impl AsRef<str>,
        id: impl fmt::Display,
        options: Option<RequestOptions>,
    ) -> Result<(), ApiError> {
        self.delete(with_id(endpoint.as_ref(), &id), options).await
    }

    /// Uploads a file as multipart form data.
    ///
    /// The file is sent under the `file` key; every additional field is
    /// stringified.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::post`].
    pub async fn upload_file<T, K, V>(
        &self,
        endpoint: impl AsRef<str>,
        file: FilePart,
        fields: impl IntoIterator<Item = (K, V)>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        K: Into<String>,
        V: ToString,
    {
        self.upload(endpoint.as_ref(), file, collect_fields(fields), None)
            .await
    }

    /// Uploads a file, publishing progress to `progress` as it is sent.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::post`].
    pub async fn upload_file_with_progress<T, K, V>(
        &self,
        endpoint: impl AsRef<str>,
        file: FilePart,
        fields: impl IntoIterator<Item = (K, V)>,
        progress: watch::Sender<UploadProgress>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        K: Into<String>,
        V: ToString,
    {
        self.upload(
            endpoint.as_ref(),
            file,
            collect_fields(fields),
            Some(progress),
        )
        .await
    }

    /// Probes the backend health endpoint.
    ///
    /// This is an ordinary GET, so a fresh cached status is reused. Call
    /// `get(HEALTH_PATH, ..)` with `Cache-Control: no-cache` to force a probe.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        self.get(HEALTH_PATH, None).await
    }

    // Internals

    async fn send_json<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: HttpMethod,
        endpoint: &str,
        body: &B,
        options: Option<RequestOptions>,
    ) -> Result<T, ApiError> {
        let url = self.url(endpoint);
        let body = serde_json::to_value(body)
            .map_err(|e| Self::transport_error(&TransportError::Serialization(e), &url))?;
        let response = self
            .send(method, &url, options, Some(RequestBody::Json(body)), &[])
            .await?;
        Self::decode(response, &url)
    }

    async fn upload<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        file: FilePart,
        fields: Vec<(String, String)>,
        progress: Option<watch::Sender<UploadProgress>>,
    ) -> Result<T, ApiError> {
        let options = RequestOptions::new().report_progress(true);
        let body = RequestBody::Multipart(MultipartPayload { file, fields });

        let url = self.url(endpoint);
        let mut builder = Self::request_builder(HttpMethod::Post, &url, options, &[]);
        if let Some(sender) = progress {
            builder = builder.progress(Arc::new(sender));
        }
        let request = builder
            .body(body)
            .build()
            .map_err(|e| Self::transport_error(&TransportError::from(e), &url))?;

        let response = self.execute(request, &url).await?;
        Self::decode(response, &url)
    }

    async fn send(
        &self,
        method: HttpMethod,
        url: &str,
        options: Option<RequestOptions>,
        body: Option<RequestBody>,
        extra_query: &[(String, String)],
    ) -> Result<HttpResponse, ApiError> {
        let mut builder =
            Self::request_builder(method, url, options.unwrap_or_default(), extra_query);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let request = builder
            .build()
            .map_err(|e| Self::transport_error(&TransportError::from(e), url))?;

        self.execute(request, url).await
    }

    fn request_builder(
        method: HttpMethod,
        url: &str,
        options: RequestOptions,
        extra_query: &[(String, String)],
    ) -> HttpRequestBuilder {
        let mut builder = HttpRequest::builder(method, url)
            .header("content-type", JSON_CONTENT_TYPE)
            .header("accept", JSON_CONTENT_TYPE);

        for (name, value) in options.headers {
            builder = builder.header(&name, value);
        }
        for (key, value) in options.query {
            builder = builder.append_query_param(key, value);
        }
        for (key, value) in extra_query {
            builder = builder.query_param(key.as_str(), value);
        }
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        builder.report_progress(options.report_progress)
    }

    async fn execute(&self, request: HttpRequest, url: &str) -> Result<HttpResponse, ApiError> {
        let response = self.inner.pipeline.execute(request).await?;
        if response.is_ok() {
            return Ok(response);
        }
        // Only reachable when the normalization policy is missing from the chain
        let error = normalizer::normalize_response(&response);
        normalizer::log_error(&error, url);
        Err(error)
    }

    fn transport_error(error: &TransportError, url: &str) -> ApiError {
        let error = normalizer::normalize_transport(error);
        normalizer::log_error(&error, url);
        error
    }

    /// Rejects an unsuccessful envelope and returns the inner payload.
    fn unwrap_envelope(
        response: HttpResponse,
        url: &str,
    ) -> Result<serde_json::Value, ApiError> {
        if success_flag(&response.body) == Some(false) {
            let error = normalizer::normalize_unsuccessful(response.code, &response.body);
            normalizer::log_error(&error, url);
            return Err(error);
        }
        Ok(Envelope::classify(response.body).into_payload())
    }

    fn decode<T: DeserializeOwned>(response: HttpResponse, url: &str) -> Result<T, ApiError> {
        let status = response.code;
        let payload = Self::unwrap_envelope(response, url)?;
        serde_json::from_value(payload).map_err(|e| Self::decode_error(status, &e, url))
    }

    fn decode_error(status: u16, error: &serde_json::Error, url: &str) -> ApiError {
        let error = normalizer::normalize_decode(status, error);
        normalizer::log_error(&error, url);
        error
    }
}

fn with_id(endpoint: &str, id: &dyn fmt::Display) -> String {
    format!(
        "{}/{}",
        endpoint.trim_end_matches('/'),
        urlencoding::encode(&id.to_string())
    )
}

fn collect_fields<K: Into<String>, V: ToString>(
    fields: impl IntoIterator<Item = (K, V)>,
) -> Vec<(String, String)> {
    fields
        .into_iter()
        .map(|(k, v)| (k.into(), v.to_string()))
        .collect()
}

fn shape_of(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
