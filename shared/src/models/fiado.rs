//! Fiado (store credit) Models

use serde::{Deserialize, Serialize};

/// Append-only payment record against a fiado sale
///
/// One row per allocation entry; the sum of rows for a sale always equals
/// that sale's `amount_paid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct FiadoPayment {
    pub id: i64,
    pub sale_id: i64,
    pub customer_id: i64,
    pub amount: f64,
    pub note: Option<String>,
    pub created_at: i64,
}

/// Customer with an outstanding fiado balance (debtors listing)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DebtorSummary {
    pub id: i64,
    pub name: String,
    pub total_owed: f64,
}

/// Line item as shown in the fiado detail view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct FiadoSaleItem {
    pub quantity: i64,
    pub unit_price: f64,
    pub product_name: String,
}

/// Fiado sale with customer name and items (detail view)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiadoSaleDetail {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: String,
    pub total: f64,
    pub amount_paid: f64,
    pub settled: bool,
    pub created_at: i64,
    pub items: Vec<FiadoSaleItem>,
}
