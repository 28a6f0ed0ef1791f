//! Oldest-first payment allocation
//!
//! Pure computation: given a customer's open fiado sales and a payment
//! amount, decide how much of the payment lands on each sale. No storage,
//! no clock, no side effects.

use rust_decimal::Decimal;

use super::money::round_money;
use super::store::LedgerSale;
use super::{LedgerError, LedgerResult};

/// What an allocation did to a single sale
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultingState {
    PartiallyPaid,
    FullySettled,
}

/// One sale's share of a payment
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationEntry {
    pub sale_id: i64,
    pub amount_applied: Decimal,
    pub new_amount_paid: Decimal,
    pub state: ResultingState,
}

/// The full distribution of one payment across open sales
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentAllocation {
    /// Entries in allocation order (oldest sale first)
    pub entries: Vec<AllocationEntry>,
    pub total_applied: Decimal,
}

/// Distribute `payment` across `open_sales`, oldest first.
///
/// `open_sales` must be non-settled rows sorted ascending by `created_at`
/// then `id` (the store guarantees this ordering). `payment` must already
/// be validated and rounded to two decimals. The payment must not exceed
/// the total owed; partial payments land whole on the oldest sales and the
/// remainder partially pays the first sale it cannot cover.
pub fn allocate(
    customer_id: i64,
    open_sales: &[LedgerSale],
    payment: Decimal,
) -> LedgerResult<PaymentAllocation> {
    if open_sales.is_empty() {
        return Err(LedgerError::NoOpenSales(customer_id));
    }

    let total_owed: Decimal = open_sales.iter().map(|s| s.owed()).sum();
    if payment > total_owed {
        return Err(LedgerError::InvalidPaymentAmount(format!(
            "payment {} exceeds total owed {}",
            payment, total_owed
        )));
    }

    let mut remaining = payment;
    let mut entries = Vec::new();

    for sale in open_sales {
        if remaining == Decimal::ZERO {
            break;
        }

        let owed = sale.owed();
        let paid = round_money(super::money::to_decimal(sale.amount_paid));

        if remaining >= owed {
            // This sale is fully covered
            entries.push(AllocationEntry {
                sale_id: sale.id,
                amount_applied: owed,
                new_amount_paid: paid + owed,
                state: ResultingState::FullySettled,
            });
            remaining -= owed;
        } else {
            // Last sale touched: takes whatever is left
            entries.push(AllocationEntry {
                sale_id: sale.id,
                amount_applied: remaining,
                new_amount_paid: paid + remaining,
                state: ResultingState::PartiallyPaid,
            });
            remaining = Decimal::ZERO;
        }
    }

    Ok(PaymentAllocation {
        entries,
        total_applied: payment,
    })
}
