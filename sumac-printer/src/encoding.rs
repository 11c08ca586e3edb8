//! Windows-1256 encoding utilities for Arabic thermal printers
//!
//! Epson-compatible firmware exposes the Arabic glyph bank as code page
//! WPC1256 (ESC t 50). This module provides:
//! - Column-width calculation, truncation and padding (1256 glyphs are all
//!   one column wide)
//! - Converting UTF-8 to Windows-1256 while preserving ESC/POS commands

use tracing::instrument;

/// ESC t argument selecting the WPC1256 glyph bank.
pub const CODE_PAGE_CP1256: u8 = 50;

/// ESC t n - select the Arabic code page
pub const SELECT_CP1256: [u8; 3] = [0x1B, 0x74, CODE_PAGE_CP1256];

/// Encode a single char to its Windows-1256 byte
///
/// Characters outside the code page degrade to '?' rather than the
/// multi-byte numeric references encoding_rs would emit.
fn encode_char(c: char) -> u8 {
    if c.is_ascii() {
        return c as u8;
    }
    let s = c.to_string();
    let (cow, _, unmappable) = encoding_rs::WINDOWS_1256.encode(&s);
    if unmappable || cow.len() != 1 {
        b'?'
    } else {
        cow[0]
    }
}

/// Get the printed column width of a string
///
/// Windows-1256 is a single-byte encoding, so every char occupies one
/// column (unmappable chars print as a one-column '?').
pub fn display_width(s: &str) -> usize {
    s.chars().count()
}

/// Truncate a string to fit within a column width
pub fn truncate_width(s: &str, max_width: usize) -> String {
    s.chars().take(max_width).collect()
}

/// Pad a string to a specific column width
///
/// If the string is longer than the width, it will be truncated.
pub fn pad_width(s: &str, width: usize, align_right: bool) -> String {
    let current_width = display_width(s);
    if current_width >= width {
        return truncate_width(s, width);
    }
    let spaces = width - current_width;
    if align_right {
        format!("{}{}", " ".repeat(spaces), s)
    } else {
        format!("{}{}", s, " ".repeat(spaces))
    }
}

/// Convert mixed UTF-8 content (with ESC/POS commands) to Windows-1256
///
/// ASCII bytes (0x00-0x7F) are preserved exactly as is, which protects
/// ESC/POS commands from being corrupted. Only bytes >= 0x80 are treated
/// as UTF-8 sequences and converted to Windows-1256.
///
/// The Arabic code page is selected up front and re-selected after any
/// INIT command (ESC @), which resets the printer to its default page.
#[instrument(skip(bytes))]
pub fn convert_to_cp1256(bytes: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(bytes.len() + 8);

    result.extend_from_slice(&SELECT_CP1256);

    let mut buffer = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        // INIT (ESC @) resets the code page; re-arm it
        if b == 0x1B && i + 1 < bytes.len() && bytes[i + 1] == 0x40 {
            flush_buffer(&mut buffer, &mut result);

            result.push(0x1B);
            result.push(0x40);
            result.extend_from_slice(&SELECT_CP1256);

            i += 2;
            continue;
        }

        if b < 128 {
            // ASCII byte (command or ASCII text)
            flush_buffer(&mut buffer, &mut result);
            result.push(b);
        } else {
            // Part of a UTF-8 sequence
            buffer.push(b);
        }
        i += 1;
    }

    flush_buffer(&mut buffer, &mut result);

    result
}

/// Flush the non-ASCII buffer, converting UTF-8 to Windows-1256
fn flush_buffer(buffer: &mut Vec<u8>, result: &mut Vec<u8>) {
    if buffer.is_empty() {
        return;
    }

    let s = String::from_utf8_lossy(buffer);
    for c in s.chars() {
        result.push(encode_char(c));
    }
    buffer.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_width() {
        assert_eq!(display_width("hello"), 5);
        assert_eq!(display_width("شاي"), 3); // 3 Arabic chars = 3 columns
        assert_eq!(display_width("AB"), 2);
        assert_eq!(display_width("ABشاي"), 5);
    }

    #[test]
    fn test_truncate_width() {
        assert_eq!(truncate_width("hello world", 5), "hello");
        assert_eq!(truncate_width("شاي اخضر", 3), "شاي");
    }

    #[test]
    fn test_pad_width() {
        assert_eq!(pad_width("hi", 5, false), "hi   ");
        assert_eq!(pad_width("hi", 5, true), "   hi");
        assert_eq!(pad_width("hello world", 5, false), "hello");
        assert_eq!(pad_width("شاي", 5, true), "  شاي");
    }

    #[test]
    fn test_convert_preserves_commands() {
        // ESC a 1 (center), some Arabic text, newline
        let mut input = vec![0x1B, 0x61, 0x01];
        input.extend_from_slice("شاي".as_bytes());
        input.push(b'\n');

        let out = convert_to_cp1256(&input);

        // Starts with the code page select
        assert_eq!(&out[..3], &SELECT_CP1256);
        // The alignment command survives untouched
        assert_eq!(&out[3..6], &[0x1B, 0x61, 0x01]);
        // 3 Arabic chars -> exactly 3 single bytes, all >= 0x80
        assert_eq!(out.len(), 3 + 3 + 3 + 1);
        assert!(out[6..9].iter().all(|&b| b >= 0x80));
        assert_eq!(out[9], b'\n');
    }

    #[test]
    fn test_convert_rearms_after_init() {
        let input = vec![0x1B, 0x40, b'A'];
        let out = convert_to_cp1256(&input);
        // select, INIT, select again, then the text
        let expected: Vec<u8> = [
            &SELECT_CP1256[..],
            &[0x1B, 0x40],
            &SELECT_CP1256[..],
            &[b'A'],
        ]
        .concat();
        assert_eq!(out, expected);
    }

    #[test]
    fn test_euro_maps_natively() {
        // Windows-1256 carries the euro sign at 0x80
        let out = convert_to_cp1256("€".as_bytes());
        assert_eq!(&out[3..], &[0x80]);
    }

    #[test]
    fn test_unmappable_degrades_to_question_mark() {
        // Arabic-Indic digits are not part of Windows-1256
        let out = convert_to_cp1256("٣".as_bytes());
        assert_eq!(&out[3..], b"?");
    }
}
