use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use super::{Next, Policy};
use crate::auth::{CredentialStore, AUTH_TOKEN_KEY};
use crate::clients::errors::ApiError;
use crate::clients::http_request::HttpRequest;
use crate::clients::http_response::HttpResponse;

/// Attaches `Authorization: Bearer <token>` when a token is stored.
///
/// Requests whose URL contains the login path pattern are left untouched. A
/// missing token is not an error; the request goes out unauthenticated.
pub struct AuthPolicy {
    credentials: Arc<dyn CredentialStore>,
    login_path_pattern: String,
}

impl AuthPolicy {
    /// Creates the policy.
    #[must_use]
    pub fn new(credentials: Arc<dyn CredentialStore>, login_path_pattern: &str) -> Self {
        Self {
            credentials,
            login_path_pattern: login_path_pattern.to_string(),
        }
    }
}

impl fmt::Debug for AuthPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthPolicy")
            .field("login_path_pattern", &self.login_path_pattern)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Policy for AuthPolicy {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn handle(
        &self,
        mut request: HttpRequest,
        next: Next<'_>,
    ) -> Result<HttpResponse, ApiError> {
        if !self.login_path_pattern.is_empty() && request.url.contains(&self.login_path_pattern) {
            tracing::debug!(url = %request.url, "Skipping auth header for login request");
            return next.run(request).await;
        }

        if let Some(token) = self.credentials.get(AUTH_TOKEN_KEY) {
            request.set_header("authorization", format!("Bearer {token}"));
        }
        next.run(request).await
    }
}
