//! Error types for the HTTP access layer.
//!
//! This module contains the uniform error record returned by every client
//! operation, together with the lower-level errors it is derived from.
//!
//! # Error Handling
//!
//! Callers only ever see [`ApiError`]:
//!
//! - [`TransportError`]: failures below HTTP (connection, timeout, invalid
//!   request construction). Never leaves the pipeline as-is.
//! - [`InvalidHttpRequestError`]: a request that fails validation before
//!   being sent.
//! - [`ApiError`]: the normalized record with a machine `code`, a technical
//!   `message`, a `user_message` suitable for display, and optional details.
//!
//! `ApiError` values are produced by the [`normalizer`](super::normalizer)
//! only.
//!
//! # Example
//!
//! ```rust,ignore
//! use sales_api::clients::{codes, ApiError};
//!
//! match client.get::<Vec<Customer>>(Endpoint::Customer, None).await {
//!     Ok(customers) => println!("{} customers", customers.len()),
//!     Err(e) if e.code == codes::NETWORK_ERROR => println!("offline: {}", e.user_message),
//!     Err(e) => println!("{} ({}): {}", e.code, e.status.unwrap_or_default(), e.message),
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Machine-readable error codes produced by the normalizer.
///
/// Backend-specific codes pass through unchanged, and HTTP failures without a
/// backend code use `HTTP_<status>`.
pub mod codes {
    /// No response was received.
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    /// The backend rejected one or more fields.
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    /// A successful response carried a payload that could not be decoded.
    pub const INVALID_RESPONSE: &str = "INVALID_RESPONSE";
    /// The request could not be built or serialized.
    pub const INVALID_REQUEST: &str = "INVALID_REQUEST";
    /// A wrapped envelope reported `success: false` without an error body.
    pub const UNSUCCESSFUL_RESPONSE: &str = "UNSUCCESSFUL_RESPONSE";

    /// Returns the `HTTP_<status>` code for a status.
    #[must_use]
    pub fn http_status(status: u16) -> String {
        format!("HTTP_{status}")
    }
}

/// The uniform error record surfaced by every failing operation.
///
/// # Example
///
/// ```rust,ignore
/// let err = client.get::<serde_json::Value>("/missing", None).await.unwrap_err();
/// assert_eq!(err.code, "HTTP_404");
/// assert_eq!(err.status, Some(404));
/// ```
#[derive(Clone, Debug, Error, PartialEq, Serialize, Deserialize)]
#[error("{code}: {message}")]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct ApiError {
    /// Machine-readable error code (see [`codes`]).
    pub code: String,
    /// Technical message, suitable for logs.
    pub message: String,
    /// Localized message suitable for end users.
    pub user_message: String,
    /// Additional structured context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Map<String, serde_json::Value>>,
    /// HTTP status of the response, when one was received.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ApiError {
    /// Creates a new record. Crate-internal; use the normalizer.
    pub(crate) fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            user_message: user_message.into(),
            details: None,
            status: None,
        }
    }

    pub(crate) fn with_details(
        mut self,
        details: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Self {
        self.details = details;
        self
    }

    pub(crate) const fn with_status(mut self, status: Option<u16>) -> Self {
        self.status = status;
        self
    }

    /// Returns `true` if no response was received.
    #[must_use]
    pub fn is_network_error(&self) -> bool {
        self.code == codes::NETWORK_ERROR
    }

    /// Returns `true` if the backend rejected request fields.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        self.code == codes::VALIDATION_ERROR
    }
}

/// Error returned when a request fails validation before being sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// The target URL is not absolute.
    #[error("Request URL '{url}' is not absolute.")]
    RelativeUrl {
        /// The URL that was provided.
        url: String,
    },

    /// A POST, PUT or PATCH request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },
}

/// Failures below the HTTP layer.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Network, connection or timeout error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// The request body could not be serialized.
    #[error("Failed to serialize request body: {0}")]
    Serialization(#[from] serde_json::Error),
}
