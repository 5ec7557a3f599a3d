use async_trait::async_trait;

use super::{Next, Policy};
use crate::clients::errors::ApiError;
use crate::clients::http_request::HttpRequest;
use crate::clients::http_response::HttpResponse;
use crate::clients::normalizer;

/// Converts non-2xx responses into [`ApiError`] records and logs every
/// error leaving the network step.
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorNormalizationPolicy;

#[async_trait]
impl Policy for ErrorNormalizationPolicy {
    fn name(&self) -> &'static str {
        "error-normalization"
    }

    async fn handle(&self, request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, ApiError> {
        let url = request.url_with_params();
        let error = match next.run(request).await {
            Ok(response) if response.is_ok() => return Ok(response),
            Ok(response) => normalizer::normalize_response(&response),
            Err(error) => error,
        };
        normalizer::log_error(&error, &url);
        Err(error)
    }
}
