//! Domain resources of the sales backend.
//!
//! - [`models`]: wire models (`Customer`, `Order`, `OrderRequest`, ...)
//! - [`OrdersApi`]: typed facade over [`ApiClient`](crate::ApiClient),
//!   obtained with [`ApiClient::orders`](crate::ApiClient::orders)

pub mod models;
mod orders;

pub use models::{
    parse_backend_date, Customer, Employee, Order, OrderRequest, Product, SalesDatePrediction,
    Shipper,
};
pub use orders::{OrdersApi, CLIENT_ID_PARAM};
