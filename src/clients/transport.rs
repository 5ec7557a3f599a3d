//! The network seam of the pipeline.
//!
//! [`Transport`] is the innermost step of every request: it performs one HTTP
//! exchange and reports either the raw response (whatever its status) or a
//! [`TransportError`] when no response was received.
//! [`ReqwestTransport`] is the production implementation.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};

use crate::clients::errors::TransportError;
use crate::clients::http_request::{
    HttpMethod, HttpRequest, MultipartPayload, ProgressSender, RequestBody, UploadProgress,
};
use crate::clients::http_response::HttpResponse;
use crate::config::ApiConfig;

/// SDK version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Size of the chunks a progress-reporting upload is streamed in.
const UPLOAD_CHUNK_SIZE: usize = 16 * 1024;

/// Performs a single HTTP exchange.
///
/// Implementations must not retry, cache or normalize: those concerns belong
/// to the pipeline policies.
#[async_trait]
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends the request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] when no response was received.
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// [`Transport`] backed by a rustls `reqwest` client.
///
/// # Thread Safety
///
/// `ReqwestTransport` is `Send + Sync`; the underlying connection pool is
/// shared by all requests.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    timeout: Duration,
}

// Verify ReqwestTransport is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReqwestTransport>();
};

impl ReqwestTransport {
    /// Creates a transport for the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Network`] if the TLS backend cannot be
    /// initialized.
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let user_agent = format!("{user_agent_prefix}Sales API Client v{SDK_VERSION} | Rust");

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }

    /// Returns the default timeout applied when a request has no override.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Parses response headers into a `HashMap` keyed by lowercased name.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }

    /// Parses a response body. Empty bodies become `null` and non-JSON
    /// bodies are kept as a string.
    fn parse_body(text: String) -> serde_json::Value {
        if text.trim().is_empty() {
            return serde_json::Value::Null;
        }
        match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(_) => serde_json::Value::String(text),
        }
    }

    fn multipart_form(
        payload: &MultipartPayload,
        progress: Option<ProgressSender>,
    ) -> Result<Form, TransportError> {
        let file = &payload.file;
        let part = match progress {
            Some(sender) => Self::progress_part(file.bytes.clone(), sender),
            None => Part::bytes(file.bytes.clone()),
        };
        let mut part = part.file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type)?;
        }

        let mut form = Form::new().part("file", part);
        for (name, value) in &payload.fields {
            form = form.text(name.clone(), value.clone());
        }
        Ok(form)
    }

    /// Streams the file in chunks, publishing progress as each chunk is
    /// handed to the connection.
    fn progress_part(bytes: Vec<u8>, sender: ProgressSender) -> Part {
        let total = byte_count(bytes.len());
        sender.send_replace(UploadProgress { sent: 0, total });

        let chunks: Vec<Vec<u8>> = bytes.chunks(UPLOAD_CHUNK_SIZE).map(<[u8]>::to_vec).collect();
        let mut sent = 0_u64;
        let stream = futures::stream::iter(chunks).map(move |chunk| {
            sent = sent.saturating_add(byte_count(chunk.len()));
            sender.send_replace(UploadProgress { sent, total });
            Ok::<_, std::io::Error>(chunk)
        });

        Part::stream_with_length(reqwest::Body::wrap_stream(stream), total)
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        request.verify()?;

        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Patch => reqwest::Method::PATCH,
            HttpMethod::Delete => reqwest::Method::DELETE,
            HttpMethod::Head => reqwest::Method::HEAD,
            HttpMethod::Options => reqwest::Method::OPTIONS,
        };

        let mut req_builder = self
            .client
            .request(method, request.url_with_params())
            .timeout(request.timeout.unwrap_or(self.timeout));

        // The multipart encoder sets its own content type with the boundary
        let is_multipart = matches!(request.body, Some(RequestBody::Multipart(_)));
        for (name, value) in &request.headers {
            if is_multipart && name == "content-type" {
                continue;
            }
            req_builder = req_builder.header(name.as_str(), value.as_str());
        }

        match &request.body {
            Some(RequestBody::Json(body)) => {
                req_builder = req_builder.body(serde_json::to_vec(body)?);
            }
            Some(RequestBody::Multipart(payload)) => {
                let progress = if request.report_progress {
                    request.progress.clone()
                } else {
                    None
                };
                req_builder = req_builder.multipart(Self::multipart_form(payload, progress)?);
            }
            None => {}
        }

        let res = req_builder.send().await?;

        let code = res.status().as_u16();
        let headers = Self::parse_response_headers(res.headers());
        let body = Self::parse_body(res.text().await?);

        Ok(HttpResponse::new(code, headers, body))
    }
}

fn byte_count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::http_request::FilePart;
    use crate::config::BaseUrl;
    use serde_json::json;
    use std::sync::Arc;
    use tokio::sync::watch;

    fn config() -> ApiConfig {
        ApiConfig::builder()
            .base_url(BaseUrl::new("https://api.example.com/v1").unwrap())
            .timeout(Duration::from_secs(5))
            .build()
            .unwrap()
    }

    #[test]
    fn test_transport_uses_config_timeout() {
        let transport = ReqwestTransport::new(&config()).unwrap();
        assert_eq!(transport.timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_parse_body_handles_empty_and_text() {
        assert_eq!(ReqwestTransport::parse_body(String::new()), serde_json::Value::Null);
        assert_eq!(
            ReqwestTransport::parse_body("  \n".to_string()),
            serde_json::Value::Null
        );
        assert_eq!(
            ReqwestTransport::parse_body("Bad Gateway".to_string()),
            json!("Bad Gateway")
        );
        assert_eq!(
            ReqwestTransport::parse_body(r#"{"id": 1}"#.to_string()),
            json!({"id": 1})
        );
    }

    #[test]
    fn test_parse_response_headers_lowercases_names() {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("X-Request-ID", "abc".parse().unwrap());
        headers.append("Set-Cookie", "a=1".parse().unwrap());
        headers.append("Set-Cookie", "b=2".parse().unwrap());

        let parsed = ReqwestTransport::parse_response_headers(&headers);
        assert_eq!(parsed["x-request-id"], vec!["abc".to_string()]);
        assert_eq!(parsed["set-cookie"].len(), 2);
    }

    #[test]
    fn test_progress_part_publishes_initial_progress() {
        let (tx, rx) = watch::channel(UploadProgress::default());
        let bytes = vec![0_u8; UPLOAD_CHUNK_SIZE * 2 + 10];

        let _part = ReqwestTransport::progress_part(bytes, Arc::new(tx));

        let progress = *rx.borrow();
        assert_eq!(progress.sent, 0);
        assert_eq!(progress.total, byte_count(UPLOAD_CHUNK_SIZE * 2 + 10));
    }

    #[test]
    fn test_multipart_form_rejects_invalid_mime() {
        let payload = MultipartPayload {
            file: FilePart::new("a.txt", b"hi".to_vec()).content_type("not a mime"),
            fields: vec![],
        };
        assert!(ReqwestTransport::multipart_form(&payload, None).is_err());
    }
}
