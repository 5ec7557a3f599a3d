//! Named backend endpoints.

use std::fmt;

/// The named endpoint table of the sales backend.
///
/// Each variant maps to a literal path relative to the configured base URL.
/// Every client method also accepts a plain string, so literal paths and
/// absolute URLs remain available for anything not listed here.
///
/// # Example
///
/// ```rust
/// use sales_api::Endpoint;
///
/// assert_eq!(Endpoint::Customer.as_path(), "/Customer");
/// assert_eq!(
///     Endpoint::SalesDatePrediction.to_string(),
///     "/Order/getSalesDatePrediction"
/// );
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Endpoint {
    /// Customer collection.
    Customer,
    /// Order collection.
    Order,
    /// Employee collection.
    Employee,
    /// Product collection.
    Product,
    /// Shipper collection.
    Shipper,
    /// Computed next-order-date prediction per customer.
    SalesDatePrediction,
}

impl Endpoint {
    /// All named endpoints.
    pub const ALL: [Self; 6] = [
        Self::Customer,
        Self::Order,
        Self::Employee,
        Self::Product,
        Self::Shipper,
        Self::SalesDatePrediction,
    ];

    /// Returns the path for this endpoint.
    #[must_use]
    pub const fn as_path(&self) -> &'static str {
        match self {
            Self::Customer => "/Customer",
            Self::Order => "/Order",
            Self::Employee => "/Employee",
            Self::Product => "/Product",
            Self::Shipper => "/Shipper",
            Self::SalesDatePrediction => "/Order/getSalesDatePrediction",
        }
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        self.as_path()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_path())
    }
}
