//! Display formatting: numerals, money, timestamps
//!
//! All numeric display pivots on the receipt's content classification:
//! Arabic receipts get Arabic-Indic numerals through a fixed substitution
//! table and the localized currency label; plain receipts get ASCII
//! digits and the base currency code.

use crate::config::ReceiptTemplate;
use crate::money::to_f64;
use chrono::{DateTime, Local, Utc};
use rust_decimal::Decimal;

/// Arabic-Indic digit substitution table, indexed by ASCII digit value
const ARABIC_DIGITS: [char; 10] = ['٠', '١', '٢', '٣', '٤', '٥', '٦', '٧', '٨', '٩'];

/// Replace ASCII digits with Arabic-Indic numerals, everything else
/// passes through unchanged.
pub fn to_arabic_digits(s: &str) -> String {
    s.chars()
        .map(|c| match c.to_digit(10) {
            Some(d) if c.is_ascii_digit() => ARABIC_DIGITS[d as usize],
            _ => c,
        })
        .collect()
}

fn apply_numerals(s: String, arabic: bool) -> String {
    if arabic { to_arabic_digits(&s) } else { s }
}

/// Monetary amount, always two decimals, never NaN
pub fn fmt_money(value: Decimal, arabic: bool) -> String {
    apply_numerals(format!("{:.2}", to_f64(value)), arabic)
}

/// Quantity, whole numbers without a fraction part
pub fn fmt_quantity(value: Decimal, arabic: bool) -> String {
    let s = if value.is_integer() {
        value.trunc().to_string()
    } else {
        format!("{:.2}", to_f64(value))
    };
    apply_numerals(s, arabic)
}

/// Order timestamp in station-local time
pub fn fmt_timestamp(ts: DateTime<Utc>, arabic: bool) -> String {
    let s = ts
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M")
        .to_string();
    apply_numerals(s, arabic)
}

/// Currency label matching the numeral style
pub fn currency_label(template: &ReceiptTemplate, arabic: bool) -> &str {
    if arabic {
        &template.currency_localized
    } else {
        &template.currency_code
    }
}
