use async_trait::async_trait;
use rand::distributions::Alphanumeric;
use rand::Rng;

use super::{Next, Policy};
use crate::clients::errors::ApiError;
use crate::clients::http_request::HttpRequest;
use crate::clients::http_response::HttpResponse;

/// Header carrying the request id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const RANDOM_LEN: usize = 9;

/// Generates a request id: nine random base-36 characters followed by the
/// current Unix time in milliseconds, also in base 36.
#[must_use]
pub fn generate_request_id() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect();
    let millis = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();

    format!("{random}{}", to_base36(millis))
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        // value % 36 < 36
        #[allow(clippy::cast_possible_truncation)]
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Tags every request with a fresh `X-Request-ID`.
#[derive(Clone, Copy, Debug, Default)]
pub struct RequestIdPolicy;

#[async_trait]
impl Policy for RequestIdPolicy {
    fn name(&self) -> &'static str {
        "request-id"
    }

    async fn handle(
        &self,
        mut request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, ApiError> {
        let request_id = generate_request_id();
        tracing::debug!(request_id = %request_id, url = %request.url, "Assigned request id");
        request.set_header(REQUEST_ID_HEADER, request_id);
        next.run(request).await
    }
}
