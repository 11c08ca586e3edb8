//! Money coercion utilities using rust_decimal for precision
//!
//! Caller-supplied order data arrives as loosely-typed floats. Every
//! numeric field passes through here exactly once during normalization,
//! so a malformed amount degrades to a safe default instead of leaking
//! `NaN` into a printed receipt.

use rust_decimal::prelude::*;

/// Rounding for monetary values (2 decimal places, half-up)
const DECIMAL_PLACES: u32 = 2;

/// Convert f64 to Decimal, defaulting non-finite values to zero
#[inline]
pub fn to_decimal(value: f64) -> Decimal {
    Decimal::from_f64(value).unwrap_or_else(|| {
        tracing::error!(value = ?value, "Non-finite f64 in monetary field, defaulting to zero");
        Decimal::ZERO
    })
}

/// Convert Decimal back to f64, rounded to 2 decimal places
#[inline]
pub fn to_f64(value: Decimal) -> f64 {
    value
        .round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
        .to_f64()
        .unwrap_or(0.0)
}

/// Round to 2 decimal places for display math
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Coerce an optional monetary field, absent or malformed becomes 0
#[inline]
pub fn sanitize_amount(value: Option<f64>) -> Decimal {
    value.map(to_decimal).unwrap_or(Decimal::ZERO)
}

/// Coerce an optional quantity, absent, malformed or non-positive becomes 1
#[inline]
pub fn sanitize_quantity(value: Option<f64>) -> Decimal {
    match value.map(to_decimal) {
        Some(q) if q > Decimal::ZERO => q,
        _ => Decimal::ONE,
    }
}
