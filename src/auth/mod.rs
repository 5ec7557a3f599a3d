//! Authentication support for the sales API client.
//!
//! Authentication is limited to attaching a bearer token. The token lives in
//! a [`CredentialStore`] under [`AUTH_TOKEN_KEY`]; when it is absent requests
//! go out unauthenticated and the backend decides.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use sales_api::auth::{CredentialStore, InMemoryCredentialStore};
//!
//! let store: Arc<dyn CredentialStore> = Arc::new(InMemoryCredentialStore::with_token("t0k3n"));
//! assert_eq!(store.get("auth_token").as_deref(), Some("t0k3n"));
//! ```

mod credentials;

pub use credentials::{CredentialStore, InMemoryCredentialStore, AUTH_TOKEN_KEY};
