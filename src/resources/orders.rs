//! Orders API.

use crate::clients::{ApiClient, ApiError, RequestOptions};
use crate::config::Endpoint;

use super::models::{Employee, Order, OrderRequest, Product, SalesDatePrediction, Shipper};

/// Query parameter used to filter orders by customer.
pub const CLIENT_ID_PARAM: &str = "clientId";

/// Typed access to orders and the reference data needed to create them.
#[derive(Clone, Debug)]
pub struct OrdersApi {
    client: ApiClient,
}

impl OrdersApi {
    pub(crate) const fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// List all orders.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn list_orders(&self) -> Result<Vec<Order>, ApiError> {
        self.client.get_list(Endpoint::Order, None).await
    }

    /// List the orders of one customer.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn orders_by_customer(&self, client_id: i64) -> Result<Vec<Order>, ApiError> {
        let options = RequestOptions::new().query_param(CLIENT_ID_PARAM, client_id);
        self.client.get_list(Endpoint::Order, Some(options)).await
    }

    /// Create an order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails; rejected fields surface as
    /// `VALIDATION_ERROR`.
    pub async fn create_order(&self, order: &OrderRequest) -> Result<Order, ApiError> {
        self.client.post(Endpoint::Order, order, None).await
    }

    /// List employees.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn employees(&self) -> Result<Vec<Employee>, ApiError> {
        self.client.get_list(Endpoint::Employee, None).await
    }

    /// List products.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        self.client.get_list(Endpoint::Product, None).await
    }

    /// List shippers.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn shippers(&self) -> Result<Vec<Shipper>, ApiError> {
        self.client.get_list(Endpoint::Shipper, None).await
    }

    /// List the predicted next order date of every customer.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if the request fails.
    pub async fn sales_date_predictions(&self) -> Result<Vec<SalesDatePrediction>, ApiError> {
        self.client
            .get_list(Endpoint::SalesDatePrediction, None)
            .await
    }
}
