//! Settlement service
//!
//! Orchestrates one payment end-to-end: load the customer's open sales,
//! run the allocator, persist the outcome atomically, return a
//! reconciliation report. Concurrent settlements against the same customer
//! are serialized by a per-customer mutex held across the whole
//! load-allocate-persist sequence; different customers never contend.

use std::sync::Arc;

use dashmap::DashMap;
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::info;

use shared::util::now_millis;

use super::allocator::{ResultingState, allocate};
use super::money::{to_decimal, to_f64, validate_payment_amount};
use super::store::{LedgerStore, SaleUpdate};
use super::{LedgerError, LedgerResult};

/// A sale fully settled by a payment
#[derive(Debug, Clone, Serialize)]
pub struct SettledSale {
    pub id: i64,
    pub original_amount: f64,
}

/// A sale partially paid by a payment
#[derive(Debug, Clone, Serialize)]
pub struct UpdatedSale {
    pub id: i64,
    pub new_balance: f64,
}

/// Reconciliation report for a customer-level payment
#[derive(Debug, Clone, Serialize)]
pub struct SettlementReport {
    pub applied_amount: f64,
    pub settled_sales: Vec<SettledSale>,
    pub partially_paid_sales: Vec<UpdatedSale>,
}

/// Outcome of a payment against a single sale
#[derive(Debug, Clone, Serialize)]
pub struct SingleSaleReceipt {
    pub sale_id: i64,
    pub settled: bool,
    pub new_balance: f64,
}

/// Outcome of settling everything a customer owes
#[derive(Debug, Clone, Serialize)]
pub struct SettleAllReport {
    pub settled_count: usize,
    pub total_amount: f64,
}

/// One open sale within an [`OpenBalance`]
#[derive(Debug, Clone, Serialize)]
pub struct OpenSaleBalance {
    pub id: i64,
    pub owed: f64,
    pub created_at: i64,
}

/// A customer's outstanding tab, recomputed from the ledger on every read
#[derive(Debug, Clone, Serialize)]
pub struct OpenBalance {
    pub total_owed: f64,
    pub open_sales: Vec<OpenSaleBalance>,
}

/// The settlement core, generic over its storage backend
pub struct SettlementService<S: LedgerStore> {
    store: S,
    customer_locks: DashMap<i64, Arc<Mutex<()>>>,
}

impl<S: LedgerStore> SettlementService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            customer_locks: DashMap::new(),
        }
    }

    /// The exclusive scope for one customer's settlements
    fn customer_lock(&self, customer_id: i64) -> Arc<Mutex<()>> {
        self.customer_locks
            .entry(customer_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Apply a payment across a customer's open sales, oldest first.
    ///
    /// The whole load-allocate-persist sequence runs under the customer's
    /// lock; either every touched sale is updated or none are.
    pub async fn settle_payment(
        &self,
        customer_id: i64,
        amount: f64,
        note: Option<String>,
    ) -> LedgerResult<SettlementReport> {
        let payment = validate_payment_amount(amount)?;

        let lock = self.customer_lock(customer_id);
        let _guard = lock.lock().await;

        let open_sales = self.store.load_open_sales(customer_id).await?;
        let allocation = allocate(customer_id, &open_sales, payment)?;

        let now = now_millis();
        let updates: Vec<SaleUpdate> = allocation
            .entries
            .iter()
            .map(|entry| SaleUpdate {
                sale_id: entry.sale_id,
                customer_id,
                new_amount_paid: to_f64(entry.new_amount_paid),
                new_settled: entry.state == ResultingState::FullySettled,
                new_settled_at: (entry.state == ResultingState::FullySettled).then_some(now),
                amount_applied: to_f64(entry.amount_applied),
                note: note.clone(),
            })
            .collect();

        self.store.apply_updates(&updates).await?;

        let mut settled_sales = Vec::new();
        let mut partially_paid_sales = Vec::new();
        for entry in &allocation.entries {
            match entry.state {
                ResultingState::FullySettled => {
                    let original = open_sales
                        .iter()
                        .find(|s| s.id == entry.sale_id)
                        .map(|s| s.total)
                        .unwrap_or_default();
                    settled_sales.push(SettledSale {
                        id: entry.sale_id,
                        original_amount: original,
                    });
                }
                ResultingState::PartiallyPaid => {
                    let sale = open_sales.iter().find(|s| s.id == entry.sale_id);
                    let new_balance = sale
                        .map(|s| to_f64(s.owed() - entry.amount_applied))
                        .unwrap_or_default();
                    partially_paid_sales.push(UpdatedSale {
                        id: entry.sale_id,
                        new_balance,
                    });
                }
            }
        }

        info!(
            customer_id,
            amount,
            settled = settled_sales.len(),
            partial = partially_paid_sales.len(),
            "Fiado payment settled"
        );

        Ok(SettlementReport {
            applied_amount: to_f64(allocation.total_applied),
            settled_sales,
            partially_paid_sales,
        })
    }

    /// Apply a payment to exactly one sale.
    ///
    /// The payment must not exceed that sale's outstanding balance; a
    /// settled sale is rejected, never mutated.
    pub async fn settle_single_sale(
        &self,
        sale_id: i64,
        amount: f64,
        note: Option<String>,
    ) -> LedgerResult<SingleSaleReceipt> {
        let payment = validate_payment_amount(amount)?;

        // First read only finds the owning customer; the authoritative
        // read happens again under the lock
        let sale = self
            .store
            .load_sale(sale_id)
            .await?
            .ok_or(LedgerError::SaleNotFound(sale_id))?;

        let lock = self.customer_lock(sale.customer_id);
        let _guard = lock.lock().await;

        let sale = self
            .store
            .load_sale(sale_id)
            .await?
            .ok_or(LedgerError::SaleNotFound(sale_id))?;
        if sale.settled {
            return Err(LedgerError::SaleAlreadySettled(sale_id));
        }

        let owed = sale.owed();
        if payment > owed {
            return Err(LedgerError::InvalidPaymentAmount(format!(
                "payment {} exceeds outstanding balance {}",
                payment, owed
            )));
        }

        let settled = payment == owed;
        let new_amount_paid = to_decimal(sale.amount_paid) + payment;
        let update = SaleUpdate {
            sale_id,
            customer_id: sale.customer_id,
            new_amount_paid: to_f64(new_amount_paid),
            new_settled: settled,
            new_settled_at: settled.then(now_millis),
            amount_applied: to_f64(payment),
            note,
        };
        self.store.apply_updates(std::slice::from_ref(&update)).await?;

        info!(sale_id, amount, settled, "Single-sale fiado payment settled");

        Ok(SingleSaleReceipt {
            sale_id,
            settled,
            new_balance: to_f64(owed - payment),
        })
    }

    /// Settle everything the customer owes in one stroke.
    ///
    /// Equivalent to a payment of exactly the total owed.
    pub async fn settle_all_open_sales(
        &self,
        customer_id: i64,
        note: Option<String>,
    ) -> LedgerResult<SettleAllReport> {
        let lock = self.customer_lock(customer_id);
        let _guard = lock.lock().await;

        let open_sales = self.store.load_open_sales(customer_id).await?;
        if open_sales.is_empty() {
            return Err(LedgerError::NoOpenSales(customer_id));
        }

        let now = now_millis();
        let mut total = Decimal::ZERO;
        let updates: Vec<SaleUpdate> = open_sales
            .iter()
            .map(|sale| {
                let owed = sale.owed();
                total += owed;
                SaleUpdate {
                    sale_id: sale.id,
                    customer_id,
                    new_amount_paid: sale.total,
                    new_settled: true,
                    new_settled_at: Some(now),
                    amount_applied: to_f64(owed),
                    note: note.clone(),
                }
            })
            .collect();

        self.store.apply_updates(&updates).await?;

        info!(
            customer_id,
            settled = updates.len(),
            total = to_f64(total),
            "All open fiado sales settled"
        );

        Ok(SettleAllReport {
            settled_count: updates.len(),
            total_amount: to_f64(total),
        })
    }

    /// Current outstanding balance, always recomputed from the ledger
    pub async fn open_balance(&self, customer_id: i64) -> LedgerResult<OpenBalance> {
        let open_sales = self.store.load_open_sales(customer_id).await?;

        let mut total_owed = Decimal::ZERO;
        let sales = open_sales
            .iter()
            .map(|sale| {
                let owed = sale.owed();
                total_owed += owed;
                OpenSaleBalance {
                    id: sale.id,
                    owed: to_f64(owed),
                    created_at: sale.created_at,
                }
            })
            .collect();

        Ok(OpenBalance {
            total_owed: to_f64(total_owed),
            open_sales: sales,
        })
    }
}
