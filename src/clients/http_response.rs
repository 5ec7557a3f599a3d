//! HTTP response types for the sales API client.
//!
//! This module provides the [`HttpResponse`] type, the [`Envelope`] sum type
//! describing the two payload shapes the backend emits, and the
//! [`PaginatedEnvelope`] returned by paginated reads.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Key of the success flag in a wrapped envelope.
const SUCCESS_KEY: &str = "success";
/// Misspelled success key emitted by some backend endpoints.
const SUCCESS_KEY_MISSPELLED: &str = "sucess";
/// Key of the payload in a wrapped envelope.
const RESULT_KEY: &str = "result";

/// An HTTP response from the backend.
///
/// Contains the status code, the headers (lowercased names, possibly
/// multi-valued) and the parsed body. Non-JSON bodies are kept as a JSON
/// string and empty bodies as `null`.
#[derive(Clone, Debug, PartialEq)]
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers (headers may have multiple values).
    pub headers: HashMap<String, Vec<String>>,
    /// The parsed response body.
    pub body: serde_json::Value,
}

impl HttpResponse {
    /// Creates a new `HttpResponse`.
    #[must_use]
    pub const fn new(
        code: u16,
        headers: HashMap<String, Vec<String>>,
        body: serde_json::Value,
    ) -> Self {
        Self {
            code,
            headers,
            body,
        }
    }

    /// Returns `true` if the response status code is in the 2xx range.
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.code >= 200 && self.code <= 299
    }

    /// Returns the canonical reason phrase for the status code.
    #[must_use]
    pub fn status_text(&self) -> &'static str {
        canonical_reason(self.code)
    }

    /// Returns the first value of a header, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `X-Request-Id` header value echoed by the backend, if present.
    #[must_use]
    pub fn request_id(&self) -> Option<&str> {
        self.header("x-request-id")
    }
}

/// Returns the canonical reason phrase for a status code.
#[must_use]
pub fn canonical_reason(code: u16) -> &'static str {
    reqwest::StatusCode::from_u16(code)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown Error")
}

/// The outer JSON structure of a backend payload.
///
/// The backend either returns the payload bare, or wraps it as
/// `{ "success": bool, "result": T }`. Some endpoints misspell the flag as
/// `sucess`; both spellings are accepted as equivalent.
///
/// # Example
///
/// ```rust
/// use sales_api::clients::Envelope;
/// use serde_json::json;
///
/// let wrapped = Envelope::classify(json!({"sucess": true, "result": [1, 2]}));
/// assert_eq!(wrapped, Envelope::Wrapped { ok: true, result: json!([1, 2]) });
///
/// let bare = Envelope::classify(json!([1, 2]));
/// assert_eq!(bare.into_payload(), json!([1, 2]));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Envelope<T> {
    /// The payload was returned as-is.
    Bare(T),
    /// The payload was wrapped with a success flag.
    Wrapped {
        /// The success flag.
        ok: bool,
        /// The wrapped payload.
        result: T,
    },
}

impl Envelope<serde_json::Value> {
    /// Classifies a response body into one of the envelope shapes.
    ///
    /// A JSON object is treated as wrapped only when it carries a `result`
    /// key and a boolean success flag under either spelling. Everything else
    /// is bare.
    #[must_use]
    pub fn classify(body: serde_json::Value) -> Self {
        let Some(ok) = success_flag(&body) else {
            return Self::Bare(body);
        };

        match body {
            serde_json::Value::Object(mut map) if map.contains_key(RESULT_KEY) => Self::Wrapped {
                ok,
                result: map.remove(RESULT_KEY).unwrap_or_default(),
            },
            other => Self::Bare(other),
        }
    }
}

impl<T> Envelope<T> {
    /// Returns the payload regardless of the envelope shape.
    pub fn into_payload(self) -> T {
        match self {
            Self::Bare(payload) | Self::Wrapped { result: payload, .. } => payload,
        }
    }

    /// Returns `false` only for a wrapped envelope whose flag is false.
    pub const fn is_success(&self) -> bool {
        match self {
            Self::Bare(_) => true,
            Self::Wrapped { ok, .. } => *ok,
        }
    }
}

/// Reads the success flag from a body under either spelling.
///
/// The correctly spelled key wins when both hold a boolean.
#[must_use]
pub fn success_flag(body: &serde_json::Value) -> Option<bool> {
    let map = body.as_object()?;
    map.get(SUCCESS_KEY)
        .and_then(serde_json::Value::as_bool)
        .or_else(|| {
            map.get(SUCCESS_KEY_MISSPELLED)
                .and_then(serde_json::Value::as_bool)
        })
}

/// Pagination metadata of a [`PaginatedEnvelope`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMeta {
    /// Current page number.
    #[serde(default)]
    pub page: u32,
    /// Page size.
    #[serde(default)]
    pub limit: u32,
    /// Total number of items.
    #[serde(default)]
    pub total: u64,
    /// Total number of pages.
    #[serde(default)]
    pub total_pages: u32,
    /// Whether a next page exists.
    #[serde(default)]
    pub has_next: bool,
    /// Whether a previous page exists.
    #[serde(default)]
    pub has_previous: bool,
}

/// A page of results returned by [`ApiClient::get_paginated`](crate::ApiClient::get_paginated).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedEnvelope<T> {
    /// Items on this page.
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    /// Backend success flag.
    #[serde(default = "default_true", alias = "sucess")]
    pub success: bool,
    /// Optional backend message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Backend timestamp.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Backend request id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    /// Pagination metadata.
    #[serde(default)]
    pub pagination: PaginationMeta,
}

const fn default_true() -> bool {
    true
}
