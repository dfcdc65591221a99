//! Fixed-point amounts.
//!
//! Balances and rewards are stored as integer cents so that increments are
//! exact on every backend. Decimals only appear at the HTTP and config edges.

use std::str::FromStr;

use rust_decimal::{ Decimal, RoundingStrategy };

use crate::error::{ AppError, Result };

/// Number of fractional digits kept for every amount.
pub const SCALE: u32 = 2;

/// Convert a decimal amount to cents, rounding half away from zero.
pub fn to_cents(amount: Decimal) -> Result<i64> {
    let rounded = amount.round_dp_with_strategy(SCALE, RoundingStrategy::MidpointAwayFromZero);
    let factor = 10i128.pow(SCALE - rounded.scale());

    rounded
        .mantissa()
        .checked_mul(factor)
        .and_then(|cents| i64::try_from(cents).ok())
        .ok_or_else(|| AppError::InvalidInput(format!("Amount out of range: {}", amount)))
}

pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, SCALE)
}

/// Parse a decimal string such as `"3.00"` into cents.
pub fn parse_cents(value: &str) -> Result<i64> {
    let amount = Decimal::from_str(value.trim()).map_err(|_|
        AppError::InvalidInput(format!("Invalid amount: {}", value))
    )?;
    to_cents(amount)
}

/// Reject zero and negative amounts.
pub fn require_positive(cents: i64, field: &str) -> Result<i64> {
    if cents <= 0 {
        return Err(AppError::InvalidInput(format!("{} must be greater than zero", field)));
    }
    Ok(cents)
}
