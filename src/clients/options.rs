//! Per-call request options and pagination parameters.

use std::fmt;
use std::time::Duration;

/// Options accepted by every [`ApiClient`](crate::ApiClient) verb.
///
/// Caller headers override the client defaults per key (case-insensitive).
/// Query values are stringified.
///
/// # Example
///
/// ```rust
/// use std::time::Duration;
/// use sales_api::RequestOptions;
///
/// let options = RequestOptions::new()
///     .header("Cache-Control", "no-cache")
///     .query_param("clientId", 7)
///     .timeout(Duration::from_secs(5));
///
/// assert_eq!(options.query, vec![("clientId".to_string(), "7".to_string())]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Extra headers, in insertion order.
    pub headers: Vec<(String, String)>,
    /// Query parameters, in insertion order.
    pub query: Vec<(String, String)>,
    /// Per-call timeout override.
    pub timeout: Option<Duration>,
    /// Publish upload progress for this call.
    pub report_progress: bool,
    /// Send cookies with cross-origin requests. Carried for API parity only;
    /// the transport keeps no cookie store, so the flag has no effect.
    pub with_credentials: bool,
}

impl RequestOptions {
    /// Creates empty options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn query_param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Sets the per-call timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Requests upload progress reporting.
    #[must_use]
    pub const fn report_progress(mut self, report: bool) -> Self {
        self.report_progress = report;
        self
    }

    /// Sets the credentials flag.
    #[must_use]
    pub const fn with_credentials(mut self, with_credentials: bool) -> Self {
        self.with_credentials = with_credentials;
        self
    }
}

/// Sort direction for paginated reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending.
    Desc,
}

impl SortOrder {
    /// Returns the wire value.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-shaping values for paginated reads.
///
/// Only present fields are sent. An empty `sort_by` is treated as absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PaginationParams {
    /// Page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Sort field.
    pub sort_by: Option<String>,
    /// Sort direction.
    pub sort_order: Option<SortOrder>,
}

impl PaginationParams {
    /// Creates empty pagination parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the page number.
    #[must_use]
    pub const fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the sort field.
    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>) -> Self {
        self.sort_by = Some(field.into());
        self
    }

    /// Sets the sort direction.
    #[must_use]
    pub const fn sort_order(mut self, order: SortOrder) -> Self {
        self.sort_order = Some(order);
        self
    }

    /// Returns the query parameters for the present fields.
    #[must_use]
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(page) = self.page {
            params.push(("page".to_string(), page.to_string()));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(sort_by) = self.sort_by.as_deref().filter(|s| !s.is_empty()) {
            params.push(("sortBy".to_string(), sort_by.to_string()));
        }
        if let Some(order) = self.sort_order {
            params.push(("sortOrder".to_string(), order.to_string()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pagination_sends_nothing() {
        assert!(PaginationParams::new().to_query().is_empty());
    }

    #[test]
    fn test_pagination_omits_absent_fields() {
        let query = PaginationParams::new().page(0).sort_order(SortOrder::Desc).to_query();

        assert_eq!(
            query,
            vec![
                ("page".to_string(), "0".to_string()),
                ("sortOrder".to_string(), "desc".to_string())
            ]
        );
    }

    #[test]
    fn test_empty_sort_field_is_absent() {
        let query = PaginationParams::new().sort_by("").limit(10).to_query();
        assert_eq!(query, vec![("limit".to_string(), "10".to_string())]);
    }

    #[test]
    fn test_request_options_builder() {
        let options = RequestOptions::new()
            .header("X-Trace", "1")
            .query_param("active", true)
            .report_progress(true)
            .with_credentials(true);

        assert_eq!(options.headers, vec![("X-Trace".to_string(), "1".to_string())]);
        assert_eq!(options.query, vec![("active".to_string(), "true".to_string())]);
        assert!(options.report_progress);
        assert!(options.with_credentials);
        assert!(options.timeout.is_none());
    }
}
