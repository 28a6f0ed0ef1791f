//! Sale Models
//!
//! A sale is either paid on the spot (`is_fiado = false`, settled at
//! creation) or put on the customer's running tab (`is_fiado = true`), in
//! which case it becomes an open entry in the credit ledger until payments
//! bring `amount_paid` up to `total`.

use serde::{Deserialize, Serialize};

/// Sale record (ledger entry when `is_fiado`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Sale {
    pub id: i64,
    pub customer_id: Option<i64>,
    /// Original sale amount; immutable after creation
    pub total: f64,
    pub is_fiado: bool,
    /// Cumulative amount paid against this sale; never decreases
    pub amount_paid: f64,
    /// True iff `amount_paid` covers `total`
    pub settled: bool,
    pub created_at: i64,
    /// Set exactly once, when the sale becomes settled
    pub settled_at: Option<i64>,
}

/// Line item of a recorded sale
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct SaleItem {
    pub id: i64,
    pub sale_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
    pub subtotal: f64,
}

/// Line item input when recording a sale
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItemInput {
    pub product_id: i64,
    pub quantity: i64,
    pub unit_price: f64,
}

/// Create sale payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleCreate {
    pub customer_id: Option<i64>,
    pub total: f64,
    #[serde(default)]
    pub is_fiado: bool,
    pub items: Vec<SaleItemInput>,
}
