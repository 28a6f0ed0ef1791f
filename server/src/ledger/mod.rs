//! Fiado Ledger
//!
//! The credit ("fiado") settlement core. A customer's tab is the set of
//! their open fiado sales; payments are allocated oldest-first across
//! that set. This module is independent of the HTTP layer:
//!
//! - [`money`] - decimal arithmetic helpers for two-decimal currency
//! - [`allocator`] - pure oldest-first payment allocation
//! - [`store`] - storage abstraction the settlement service runs on
//! - [`settlement`] - the service tying allocation to atomic persistence

pub mod allocator;
pub mod money;
pub mod settlement;
pub mod store;

pub use allocator::{AllocationEntry, PaymentAllocation, ResultingState, allocate};
pub use settlement::{
    OpenBalance, SettleAllReport, SettlementReport, SettlementService, SingleSaleReceipt,
};
pub use store::{LedgerSale, LedgerStore, SaleUpdate};

/// Errors produced by the settlement core
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("Invalid payment amount: {0}")]
    InvalidPaymentAmount(String),

    #[error("No open fiado sales for customer {0}")]
    NoOpenSales(i64),

    #[error("Sale {0} not found")]
    SaleNotFound(i64),

    #[error("Sale {0} is already settled")]
    SaleAlreadySettled(i64),

    #[error("Concurrent settlement conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
