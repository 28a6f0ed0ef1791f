//! Product Model

use serde::{Deserialize, Serialize};

/// Product entity
///
/// Prices are stored with two-decimal precision; `fiado_price` is the
/// (usually higher) price charged on store-credit sales.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub cost_price: f64,
    pub sale_price: f64,
    pub fiado_price: f64,
    pub stock_quantity: i64,
    /// Threshold below which the product counts as low stock
    pub min_stock: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Create product payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub cost_price: f64,
    #[serde(default)]
    pub sale_price: f64,
    #[serde(default)]
    pub fiado_price: f64,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub min_stock: i64,
}

/// Update product payload (partial; `None` keeps the current value)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub cost_price: Option<f64>,
    pub sale_price: Option<f64>,
    pub fiado_price: Option<f64>,
    pub stock_quantity: Option<i64>,
    pub min_stock: Option<i64>,
}
