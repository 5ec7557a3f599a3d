//! Process-local credential storage.
//!
//! This module provides the [`CredentialStore`] trait consulted by the
//! auth policy, and [`InMemoryCredentialStore`], a thread-safe map-backed
//! implementation.

use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// Key under which the bearer token is stored.
pub const AUTH_TOKEN_KEY: &str = "auth_token";

/// A source of opaque credential strings keyed by name.
///
/// Implementations must be cheap to query; the auth policy calls
/// [`CredentialStore::get`] once per outbound request.
pub trait CredentialStore: Send + Sync {
    /// Returns the credential stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;
}

/// A thread-safe in-memory credential store.
///
/// Empty values are treated as absent.
///
/// # Security
///
/// The `Debug` implementation lists key names only, never values.
///
/// # Example
///
/// ```rust
/// use sales_api::auth::{CredentialStore, InMemoryCredentialStore, AUTH_TOKEN_KEY};
///
/// let store = InMemoryCredentialStore::new();
/// assert!(store.get(AUTH_TOKEN_KEY).is_none());
///
/// store.set(AUTH_TOKEN_KEY, "secret-token");
/// assert_eq!(store.get(AUTH_TOKEN_KEY).as_deref(), Some("secret-token"));
/// ```
#[derive(Default)]
pub struct InMemoryCredentialStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryCredentialStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding a bearer token under [`AUTH_TOKEN_KEY`].
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let store = Self::new();
        store.set(AUTH_TOKEN_KEY, token);
        store
    }

    /// Stores a credential, replacing any previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.insert(key.into(), value.into());
    }

    /// Removes a credential, returning the previous value.
    pub fn remove(&self, key: &str) -> Option<String> {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.remove(key)
    }
}

impl CredentialStore for InMemoryCredentialStore {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        entries.get(key).filter(|v| !v.is_empty()).cloned()
    }
}

impl fmt::Debug for InMemoryCredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut keys: Vec<&String> = entries.keys().collect();
        keys.sort();
        f.debug_struct("InMemoryCredentialStore")
            .field("keys", &keys)
            .finish()
    }
}
