//! HTTP request types for the sales API client.
//!
//! This module provides the [`HttpRequest`] descriptor and its builder. A
//! request always targets an absolute URL; endpoint resolution against the
//! base URL happens in [`ApiClient`](crate::ApiClient) before a request is
//! built.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

use crate::clients::errors::InvalidHttpRequestError;
use crate::config::is_absolute;

/// HTTP methods supported by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// HTTP GET method for retrieving resources.
    Get,
    /// HTTP POST method for creating resources.
    Post,
    /// HTTP PUT method for replacing resources.
    Put,
    /// HTTP PATCH method for partially updating resources.
    Patch,
    /// HTTP DELETE method for removing resources.
    Delete,
    /// HTTP HEAD method.
    Head,
    /// HTTP OPTIONS method.
    Options,
}

impl HttpMethod {
    /// Returns the uppercase method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Head => "HEAD",
            Self::Options => "OPTIONS",
        }
    }

    /// Returns `true` for methods without side effects.
    ///
    /// POST, PUT, PATCH and DELETE are never retried.
    #[must_use]
    pub const fn is_side_effect_free(&self) -> bool {
        !matches!(self, Self::Post | Self::Put | Self::Patch | Self::Delete)
    }

    /// Returns `true` for methods that must carry a body.
    #[must_use]
    pub const fn requires_body(&self) -> bool {
        matches!(self, Self::Post | Self::Put | Self::Patch)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file to upload as the `file` part of a multipart request.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    /// File name reported to the backend.
    pub file_name: String,
    /// MIME type of the content, if known.
    pub content_type: Option<String>,
    /// File content.
    pub bytes: Vec<u8>,
}

impl FilePart {
    /// Creates a new file part.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    /// Sets the MIME type of the content.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// A multipart payload: one file plus stringified form fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MultipartPayload {
    /// The file, sent under the `file` key.
    pub file: FilePart,
    /// Additional text fields, in insertion order.
    pub fields: Vec<(String, String)>,
}

/// A request body.
#[derive(Clone, Debug, PartialEq)]
pub enum RequestBody {
    /// A JSON document.
    Json(serde_json::Value),
    /// A multipart form with a file.
    Multipart(MultipartPayload),
}

/// Progress of a streamed upload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UploadProgress {
    /// Bytes of the file handed to the connection so far.
    pub sent: u64,
    /// Total bytes of the file.
    pub total: u64,
}

impl UploadProgress {
    /// Returns `true` once every byte has been sent.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.sent >= self.total
    }
}

/// Sender side of an upload progress channel.
pub type ProgressSender = Arc<watch::Sender<UploadProgress>>;

/// An HTTP request to be dispatched through the pipeline.
///
/// Header names are stored lowercased so that per-key overrides are
/// case-insensitive.
///
/// # Example
///
/// ```rust
/// use sales_api::clients::{HttpMethod, HttpRequest};
///
/// let request = HttpRequest::builder(HttpMethod::Get, "https://api.example.com/v1/Order")
///     .query_param("clientId", 7)
///     .header("Accept", "application/json")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.url_with_params(), "https://api.example.com/v1/Order?clientId=7");
/// assert_eq!(request.header("accept"), Some("application/json"));
/// ```
#[derive(Clone, Debug)]
pub struct HttpRequest {
    /// The HTTP method for this request.
    pub method: HttpMethod,
    /// The absolute target URL, without query parameters.
    pub url: String,
    /// Query parameters, in insertion order.
    pub query: Vec<(String, String)>,
    /// Request headers keyed by lowercased name.
    pub headers: BTreeMap<String, String>,
    /// The request body, if any.
    pub body: Option<RequestBody>,
    /// Per-call timeout override.
    pub timeout: Option<Duration>,
    /// Whether upload progress should be published.
    pub report_progress: bool,
    /// Where upload progress is published.
    pub progress: Option<ProgressSender>,
}

impl HttpRequest {
    /// Creates a new builder for constructing an `HttpRequest`.
    #[must_use]
    pub fn builder(method: HttpMethod, url: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, url)
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if:
    /// - `url` is not absolute
    /// - `method` is POST, PUT or PATCH but `body` is `None`
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        if !is_absolute(&self.url) {
            return Err(InvalidHttpRequestError::RelativeUrl {
                url: self.url.clone(),
            });
        }

        if self.method.requires_body() && self.body.is_none() {
            return Err(InvalidHttpRequestError::MissingBody {
                method: self.method.to_string(),
            });
        }

        Ok(())
    }

    /// Returns a header value by case-insensitive name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Sets a header, replacing any existing value for the same name.
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
    }

    /// Returns the full URL including the percent-encoded query string.
    #[must_use]
    pub fn url_with_params(&self) -> String {
        if self.query.is_empty() {
            return self.url.clone();
        }

        let query = self
            .query
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        let separator = if self.url.contains('?') { '&' } else { '?' };

        format!("{}{separator}{query}", self.url)
    }
}

/// Builder for constructing [`HttpRequest`] instances.
#[derive(Debug)]
pub struct HttpRequestBuilder {
    request: HttpRequest,
}

impl HttpRequestBuilder {
    fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            request: HttpRequest {
                method,
                url: url.into(),
                query: Vec::new(),
                headers: BTreeMap::new(),
                body: None,
                timeout: None,
                report_progress: false,
                progress: None,
            },
        }
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json(mut self, body: impl Into<serde_json::Value>) -> Self {
        self.request.body = Some(RequestBody::Json(body.into()));
        self
    }

    /// Sets a multipart body.
    #[must_use]
    pub fn multipart(mut self, payload: MultipartPayload) -> Self {
        self.request.body = Some(RequestBody::Multipart(payload));
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: RequestBody) -> Self {
        self.request.body = Some(body);
        self
    }

    /// Sets a query parameter, replacing an existing one with the same key.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        let key = key.into();
        let value = value.to_string();
        match self.request.query.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.request.query.push((key, value)),
        }
        self
    }

    /// Appends a query parameter, keeping earlier entries with the same key.
    #[must_use]
    pub fn append_query_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.request.query.push((key.into(), value.to_string()));
        self
    }

    /// Sets a header, replacing an existing one with the same name.
    #[must_use]
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.request.set_header(name, value);
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = Some(timeout);
        self
    }

    /// Requests upload progress reporting.
    #[must_use]
    pub const fn report_progress(mut self, report: bool) -> Self {
        self.request.report_progress = report;
        self
    }

    /// Sets the channel upload progress is published to.
    #[must_use]
    pub fn progress(mut self, sender: ProgressSender) -> Self {
        self.request.progress = Some(sender);
        self
    }

    /// Builds the [`HttpRequest`], validating it in the process.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if the request fails validation.
    pub fn build(self) -> Result<HttpRequest, InvalidHttpRequestError> {
        self.request.verify()?;
        Ok(self.request)
    }
}
