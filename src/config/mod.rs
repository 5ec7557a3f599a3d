//! Configuration types for the sales API client.
//!
//! This module provides the configuration used to build an
//! [`ApiClient`](crate::ApiClient) and its request pipeline.
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`ApiConfig`]: The main configuration struct holding all client settings
//! - [`ApiConfigBuilder`]: A builder for constructing [`ApiConfig`] instances
//! - [`RetryConfig`]: Retry bounds, backoff base and retryable statuses
//! - [`BaseUrl`]: A validated base URL
//! - [`Endpoint`]: The named endpoint table
//!
//! # Example
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
//! assert_eq!(config.timeout(), Duration::from_secs(10));
//! ```

mod endpoints;
mod newtypes;

pub use endpoints::Endpoint;
pub use newtypes::{is_absolute, BaseUrl};

use std::time::Duration;

use crate::error::ConfigError;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Default lifetime of a cached GET response.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default path fragment identifying the login endpoint.
pub const DEFAULT_LOGIN_PATH: &str = "/auth/login";

/// Retry settings for idempotent requests.
///
/// The delay before retry `n` (zero-based) is `base_delay * 2^n`.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use sales_api::RetryConfig;
///
/// let retry = RetryConfig::default();
/// assert_eq!(retry.max_retries, 3);
/// assert_eq!(retry.delay_for(0), Duration::from_millis(1000));
/// assert_eq!(retry.delay_for(2), Duration::from_millis(4000));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Backoff base delay.
    pub base_delay: Duration,
    /// Statuses considered transient.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            retryable_statuses: vec![500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Returns the backoff delay before the retry with the given zero-based index.
    #[must_use]
    pub fn delay_for(&self, retry_index: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(retry_index))
    }

    /// Returns `true` if the status is one of the transient statuses.
    #[must_use]
    pub fn is_retryable(&self, status: u16) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

/// Configuration for the sales API client.
///
/// # Thread Safety
///
/// `ApiConfig` is `Clone`, `Send`, and `Sync`, making it safe to share
/// across threads and async tasks.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    base_url: BaseUrl,
    timeout: Duration,
    retry: RetryConfig,
    cache_ttl: Duration,
    login_path_pattern: String,
    user_agent_prefix: Option<String>,
}

impl ApiConfig {
    /// Creates a new builder for constructing an `ApiConfig`.
    #[must_use]
    pub fn builder() -> ApiConfigBuilder {
        ApiConfigBuilder::new()
    }

    /// Returns the base URL.
    #[must_use]
    pub const fn base_url(&self) -> &BaseUrl {
        &self.base_url
    }

    /// Returns the default per-request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the retry settings.
    #[must_use]
    pub const fn retry(&self) -> &RetryConfig {
        &self.retry
    }

    /// Returns the lifetime of cached GET responses.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        self.cache_ttl
    }

    /// Returns the path fragment that marks a login request.
    #[must_use]
    pub fn login_path_pattern(&self) -> &str {
        &self.login_path_pattern
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }
}

// Verify ApiConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ApiConfig>();
};

/// Builder for constructing [`ApiConfig`] instances.
///
/// `base_url` is required. All other fields have defaults:
///
/// - `timeout`: 30 seconds
/// - `retry`: 3 retries, 1 second base delay, statuses 500/502/503/504
/// - `cache_ttl`: 5 minutes
/// - `login_path_pattern`: `/auth/login`
/// - `user_agent_prefix`: `None`
#[derive(Debug, Default)]
pub struct ApiConfigBuilder {
    base_url: Option<BaseUrl>,
    timeout: Option<Duration>,
    retry: Option<RetryConfig>,
    cache_ttl: Option<Duration>,
    login_path_pattern: Option<String>,
    user_agent_prefix: Option<String>,
}

impl ApiConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL (required).
    #[must_use]
    pub fn base_url(mut self, base_url: BaseUrl) -> Self {
        self.base_url = Some(base_url);
        self
    }

    /// Sets the default per-request timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the retry settings.
    #[must_use]
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Sets the lifetime of cached GET responses.
    #[must_use]
    pub const fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Sets the path fragment that bypasses bearer authentication.
    #[must_use]
    pub fn login_path_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.login_path_pattern = Some(pattern.into());
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`ApiConfig`], validating that required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingRequiredField`] if `base_url` is not set,
    /// and [`ConfigError::ZeroDuration`] for a zero timeout or cache TTL.
    pub fn build(self) -> Result<ApiConfig, ConfigError> {
        let base_url = self
            .base_url
            .ok_or(ConfigError::MissingRequiredField { field: "base_url" })?;

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ConfigError::ZeroDuration { field: "timeout" });
        }

        let cache_ttl = self.cache_ttl.unwrap_or(DEFAULT_CACHE_TTL);
        if cache_ttl.is_zero() {
            return Err(ConfigError::ZeroDuration { field: "cache_ttl" });
        }

        Ok(ApiConfig {
            base_url,
            timeout,
            retry: self.retry.unwrap_or_default(),
            cache_ttl,
            login_path_pattern: self
                .login_path_pattern
                .unwrap_or_else(|| DEFAULT_LOGIN_PATH.to_string()),
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}
