//! Ledger storage abstraction
//!
//! The settlement service only needs three things from storage: an ordered
//! read of a customer's open fiado sales, a single-sale read, and an atomic
//! multi-row update. Any backend providing those semantics will do.

use async_trait::async_trait;
use rust_decimal::Decimal;

use super::LedgerResult;
use super::money::{round_money, to_decimal};

/// A fiado sale as the settlement core sees it
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct LedgerSale {
    pub id: i64,
    pub customer_id: i64,
    /// Amount owed at creation, immutable
    pub total: f64,
    /// Running total of payments, never decreases
    pub amount_paid: f64,
    pub settled: bool,
    pub created_at: i64,
    pub settled_at: Option<i64>,
}

impl LedgerSale {
    /// Outstanding balance as a two-decimal amount
    pub fn owed(&self) -> Decimal {
        let owed = round_money(to_decimal(self.total)) - round_money(to_decimal(self.amount_paid));
        owed.max(Decimal::ZERO)
    }
}

/// One row mutation within an atomic settlement write
#[derive(Debug, Clone)]
pub struct SaleUpdate {
    pub sale_id: i64,
    pub customer_id: i64,
    pub new_amount_paid: f64,
    pub new_settled: bool,
    pub new_settled_at: Option<i64>,
    /// The slice of the payment applied to this sale, recorded as an
    /// append-only audit row alongside the update
    pub amount_applied: f64,
    pub note: Option<String>,
}

/// Storage contract for the settlement core
///
/// `apply_updates` must be atomic: either every update (and its audit row)
/// commits, or none do. Reads must order open sales by `created_at` then
/// `id`, ascending.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// All non-settled fiado sales for a customer, oldest first
    async fn load_open_sales(&self, customer_id: i64) -> LedgerResult<Vec<LedgerSale>>;

    /// A single fiado sale by id, if it exists
    async fn load_sale(&self, sale_id: i64) -> LedgerResult<Option<LedgerSale>>;

    /// Persist a batch of settlement updates atomically
    async fn apply_updates(&self, updates: &[SaleUpdate]) -> LedgerResult<()>;
}
