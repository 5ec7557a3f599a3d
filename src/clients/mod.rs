//! HTTP access layer for the sales backend.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ApiClient`]: the typed client, one method per HTTP verb
//! - [`pipeline::Pipeline`]: the ordered chain of request policies
//! - [`Transport`]: the network seam, implemented by [`ReqwestTransport`]
//! - [`HttpRequest`] / [`HttpResponse`]: the request and response descriptors
//! - [`Envelope`] / [`PaginatedEnvelope`]: the payload shapes the backend emits
//! - [`ApiError`]: the uniform error record, built by the [`normalizer`]
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sales_api::clients::{PaginationParams, SortOrder};
//! use sales_api::resources::Order;
//! use sales_api::{ApiClient, ApiConfig, BaseUrl, Endpoint, InMemoryCredentialStore};
//!
//! let config = ApiConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com/v1")?)
//!     .build()?;
//! let client = ApiClient::new(config, Arc::new(InMemoryCredentialStore::new()))?;
//!
//! let page = client
//!     .get_paginated::<Order>(
//!         Endpoint::Order,
//!         &PaginationParams::new().page(1).limit(20).sort_order(SortOrder::Desc),
//!         None,
//!     )
//!     .await?;
//! println!("{} of {} orders", page.data.len(), page.pagination.total);
//! ```
//!
//! # Retry Behavior
//!
//! - **500, 502, 503, 504**: GET, HEAD and OPTIONS requests are retried up
//!   to 3 times, waiting 1s, 2s and 4s
//! - **POST, PUT, PATCH, DELETE**: never retried
//! - **Anything else**: returned immediately

mod api_client;
mod errors;
mod http_request;
mod http_response;
pub mod normalizer;
mod options;
pub mod pipeline;
mod transport;

pub use api_client::{ApiClient, HealthStatus, HEALTH_PATH};
pub use errors::{codes, ApiError, InvalidHttpRequestError, TransportError};
pub use http_request::{
    FilePart, HttpMethod, HttpRequest, HttpRequestBuilder, MultipartPayload, ProgressSender,
    RequestBody, UploadProgress,
};
pub use http_response::{
    canonical_reason, success_flag, Envelope, HttpResponse, PaginatedEnvelope, PaginationMeta,
};
pub use options::{PaginationParams, RequestOptions, SortOrder};
pub use transport::{ReqwestTransport, Transport, SDK_VERSION};
