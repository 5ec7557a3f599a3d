use async_trait::async_trait;

use super::{Next, Policy};
use crate::clients::errors::ApiError;
use crate::clients::http_request::HttpRequest;
use crate::clients::http_response::HttpResponse;
use crate::config::RetryConfig;

/// Retries transient server failures with exponential backoff.
///
/// Only methods without side effects are retried, and only when the error
/// carries one of the configured statuses. Any other failure, or the last
/// failure once the retries are used up, propagates unchanged.
#[derive(Clone, Debug)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Creates the policy.
    #[must_use]
    pub const fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    fn should_retry(&self, error: &ApiError, retries: u32) -> bool {
        retries < self.config.max_retries
            && error
                .status
                .is_some_and(|status| self.config.is_retryable(status))
    }
}

#[async_trait]
impl Policy for RetryPolicy {
    fn name(&self) -> &'static str {
        "retry"
    }

    async fn handle(&self, request: HttpRequest, next: Next<'_>) -> Result<HttpResponse, ApiError> {
        if !request.method.is_side_effect_free() {
            return next.run(request).await;
        }

        let mut retries: u32 = 0;
        loop {
            match next.run(request.clone()).await {
                Err(error) if self.should_retry(&error, retries) => {
                    let delay = self.config.delay_for(retries);
                    retries += 1;
                    tracing::warn!(
                        status = error.status.unwrap_or_default(),
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "Retry attempt {} for {}",
                        retries,
                        request.url_with_params()
                    );
                    tokio::time::sleep(delay).await;
                }
                result => return result,
            }
        }
    }
}
