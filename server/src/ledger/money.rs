//! Money calculation utilities using rust_decimal for precision
//!
//! All ledger arithmetic is done using `Decimal` internally, then converted
//! to `f64` for storage/serialization. Every stored monetary value carries
//! two decimal places.

use rust_decimal::prelude::*;

use super::{LedgerError, LedgerResult};

/// Rounding strategy for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Maximum allowed payment amount (€1,000,000)
pub const MAX_PAYMENT_AMOUNT: f64 = 1_000_000.0;

/// Convert f64 to Decimal for calculation
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_default()
}

/// Convert Decimal back to f64 for storage, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or_default()
}

/// Round a Decimal to storage precision (2 decimal places, half-up)
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Validate that a f64 value is finite (not NaN, not Infinity)
#[inline]
fn require_finite(value: f64, field_name: &str) -> LedgerResult<()> {
    if !value.is_finite() {
        return Err(LedgerError::InvalidPaymentAmount(format!(
            "{} must be a finite number, got {}",
            field_name, value
        )));
    }
    Ok(())
}

/// Validate a payment amount before allocation
///
/// The amount must be finite, strictly positive and within the maximum.
pub fn validate_payment_amount(amount: f64) -> LedgerResult<Decimal> {
    require_finite(amount, "payment amount")?;
    if amount <= 0.0 {
        return Err(LedgerError::InvalidPaymentAmount(format!(
            "payment amount must be positive, got {}",
            amount
        )));
    }
    if amount > MAX_PAYMENT_AMOUNT {
        return Err(LedgerError::InvalidPaymentAmount(format!(
            "payment amount exceeds maximum allowed ({}), got {}",
            MAX_PAYMENT_AMOUNT, amount
        )));
    }
    Ok(round_money(to_decimal(amount)))
}
