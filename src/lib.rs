//! # Sales API Client
//!
//! A typed HTTP access layer for the sales and order-management backend.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ApiConfig`] and [`ApiConfigBuilder`]
//! - A typed client, [`ApiClient`], with one method per HTTP verb plus
//!   paginated reads, id-based variants and multipart uploads
//! - A request pipeline of ordered policies: request id, auth, cache, retry,
//!   loading counter and error normalization
//! - A uniform error record, [`ApiError`], for every failure path
//! - Wire models and a typed facade for the orders endpoints
//!
//! ## Quick Start
//!
//! ```rust
//! use std::time::Duration;
//! use sales_api::{ApiConfig, BaseUrl};
//!
//! let config = ApiConfig::builder()
//!     .base_url(BaseUrl::new("https://api.example.com/v1").unwrap())
//!     .timeout(Duration::from_secs(10))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.base_url().join("Customer"), "https://api.example.com/v1/Customer");
//! ```
//!
//! ## Making API Requests
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sales_api::{ApiClient, ApiConfig, BaseUrl, Endpoint, InMemoryCredentialStore};
//! use sales_api::resources::{Customer, OrderRequest};
//!
//! let credentials = Arc::new(InMemoryCredentialStore::new());
//! let client = ApiClient::new(config, credentials.clone())?;
//!
//! // Attach a bearer token to every subsequent request
//! credentials.set(sales_api::AUTH_TOKEN_KEY, "t0k3n");
//!
//! let customers: Vec<Customer> = client.get_list(Endpoint::Customer, None).await?;
//! let order = client.orders().create_order(&OrderRequest { /* ... */ }).await?;
//! ```
//!
//! ## Error Handling
//!
//! Every operation returns `Result<_, ApiError>`:
//!
//! ```rust,ignore
//! match client.orders().list_orders().await {
//!     Ok(orders) => println!("{} orders", orders.len()),
//!     Err(e) if e.is_validation_error() => show_form_errors(&e),
//!     Err(e) => show_toast(&e.user_message),
//! }
//! ```
//!
//! ## Design Principles
//!
//! - **No global state**: the cache and loading counter are owned by each client
//! - **Fail-fast validation**: configuration newtypes validate on construction
//! - **Thread-safe**: all types are `Send + Sync`
//! - **Async-first**: designed for use with the Tokio runtime

pub mod auth;
pub mod clients;
pub mod config;
pub mod error;
pub mod resources;

// Re-export public types at crate root for convenience
pub use auth::{CredentialStore, InMemoryCredentialStore, AUTH_TOKEN_KEY};
pub use config::{ApiConfig, ApiConfigBuilder, BaseUrl, Endpoint, RetryConfig};
pub use error::ConfigError;

// Re-export HTTP client types
pub use clients::{
    ApiClient, ApiError, HealthStatus, HttpMethod, HttpRequest, HttpResponse, PaginatedEnvelope,
    PaginationParams, RequestOptions, SortOrder, TransportError,
};
