//! Content classification for rendering-strategy choice
//!
//! Receipts carrying Arabic text need glyph shaping that raw printer
//! firmware cannot be trusted with, so the dispatcher classifies content
//! before a rendering method is selected. Classification is a pure
//! function over the receipt and the configured store identity; it never
//! touches device state.

use crate::config::ReceiptTemplate;
use crate::receipt::Receipt;

/// Unicode ranges covering Arabic script
const ARABIC_RANGES: &[(u32, u32)] = &[
    (0x0600, 0x06FF), // Arabic
    (0x0750, 0x077F), // Arabic Supplement
    (0x08A0, 0x08FF), // Arabic Extended-A
    (0xFB50, 0xFDFF), // Arabic Presentation Forms-A
    (0xFE70, 0xFEFF), // Arabic Presentation Forms-B
];

/// True if the char falls in any Arabic script block
pub fn is_arabic(c: char) -> bool {
    let cp = c as u32;
    ARABIC_RANGES.iter().any(|&(lo, hi)| cp >= lo && cp <= hi)
}

/// True if any char of the string is Arabic, first match wins
pub fn contains_arabic(s: &str) -> bool {
    s.chars().any(is_arabic)
}

/// Classify a receipt's user-authored localized fields
///
/// Inspects the localized cashier name, the configured localized store
/// name, and every line item's localized name.
pub fn has_bidi_content(receipt: &Receipt, template: &ReceiptTemplate) -> bool {
    if let Some(name) = &receipt.cashier_name_localized {
        if contains_arabic(name) {
            return true;
        }
    }

    if let Some(name) = &template.store_name_localized {
        if contains_arabic(name) {
            return true;
        }
    }

    receipt
        .items
        .iter()
        .filter_map(|i| i.localized_name.as_deref())
        .any(contains_arabic)
}
