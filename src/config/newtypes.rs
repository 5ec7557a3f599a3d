//! Validated newtype wrappers for configuration values.
//!
//! This module provides type-safe wrappers around string values that validate
//! their contents on construction. Invalid values are rejected with clear error messages.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A validated base URL for the backend API (origin plus path prefix).
///
/// The URL must be absolute, use the `http` or `https` scheme and carry a
/// host. Trailing slashes are stripped so that [`BaseUrl::join`] can always
/// insert exactly one separator.
///
/// # Example
///
/// ```rust
/// use sales_api::BaseUrl;
///
/// let base = BaseUrl::new("https://api.example.com/v1/").unwrap();
/// assert_eq!(base.as_ref(), "https://api.example.com/v1");
/// assert_eq!(base.join("Customer"), "https://api.example.com/v1/Customer");
/// assert_eq!(base.join("/Customer"), "https://api.example.com/v1/Customer");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BaseUrl(String);

impl BaseUrl {
    /// Creates a new validated base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidBaseUrl`] if the URL cannot be parsed,
    /// is not http(s), or has no host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/').to_string();

        let parsed = url::Url::parse(&trimmed)
            .map_err(|_| ConfigError::InvalidBaseUrl { url: url.clone() })?;

        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(ConfigError::InvalidBaseUrl { url });
        }

        Ok(Self(trimmed))
    }

    /// Resolves an endpoint against this base URL.
    ///
    /// Absolute endpoints (anything starting with a scheme such as
    /// `https://`) pass through unchanged. Relative endpoints are joined
    /// with exactly one `/`, whether or not the caller supplied a leading
    /// slash.
    #[must_use]
    pub fn join(&self, endpoint: &str) -> String {
        if is_absolute(endpoint) {
            return endpoint.to_string();
        }
        format!("{}/{}", self.0, endpoint.trim_start_matches('/'))
    }
}

/// Returns `true` if the string begins with a URL scheme followed by `://`.
#[must_use]
pub fn is_absolute(endpoint: &str) -> bool {
    endpoint.find("://").is_some_and(|scheme_end| {
        let scheme = &endpoint[..scheme_end];
        !scheme.is_empty()
            && scheme.starts_with(|c: char| c.is_ascii_alphabetic())
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    })
}

impl AsRef<str> for BaseUrl {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for BaseUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for BaseUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}
