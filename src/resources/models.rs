//! Wire models for the backend entities.
//!
//! Field names follow the backend's camelCase JSON. Dates are kept as the
//! ISO 8601 strings the backend emits; [`Order::order_date_parsed`] and
//! friends parse them on demand.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    pub last_name: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_of_courtesy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports_to: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl Employee {
    /// Returns the backend-provided full name, or `first last`.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.full_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("{} {}", self.first_name, self.last_name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub product_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_per_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units_in_stock: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units_on_order: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reorder_level: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discontinued: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Shipper {
    pub id: i64,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub cust_id: i64,
    pub emp_id: i64,
    pub order_date: String,
    pub required_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_date: Option<String>,
    pub shipper_id: i64,
    pub freight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_country: Option<String>,
}

impl Order {
    #[must_use]
    pub fn order_date_parsed(&self) -> Option<DateTime<Utc>> {
        parse_backend_date(&self.order_date)
    }

    #[must_use]
    pub fn required_date_parsed(&self) -> Option<DateTime<Utc>> {
        parse_backend_date(&self.required_date)
    }

    #[must_use]
    pub fn shipped_date_parsed(&self) -> Option<DateTime<Utc>> {
        self.shipped_date.as_deref().and_then(parse_backend_date)
    }
}

/// Body of an order creation request.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub cust_id: i64,
    pub emp_id: i64,
    pub shipper_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_city: Option<String>,
    pub order_date: String,
    pub required_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipped_date: Option<String>,
    pub freight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_country: Option<String>,
    pub product_id: i64,
    pub unit_price: f64,
    pub qty: i64,
    pub discount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SalesDatePrediction {
    pub customer_id: i64,
    pub customer_name: String,
    pub predicted_date: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_order_date: Option<String>,
}

/// Parses an RFC 3339 timestamp, a naive `YYYY-MM-DDTHH:MM:SS[.fff]`
/// timestamp (taken as UTC) or a plain `YYYY-MM-DD` date.
#[must_use]
pub fn parse_backend_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}
