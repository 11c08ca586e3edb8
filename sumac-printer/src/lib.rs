//! # sumac-printer
//!
//! ESC/POS thermal printer library - low-level printing capabilities only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building
//! - Windows-1256 encoding for Arabic-capable printers
//! - Network printing (TCP port 9100)
//! - Image/logo processing (GS v 0 raster)
//!
//! Business logic (WHAT to print) should stay in application code:
//! - Receipt rendering and dispatch → sumac-receipt
//!
//! ## Example
//!
//! ```ignore
//! use sumac_printer::{EscPosBuilder, NetworkPrinter, Printer};
//!
//! // Build ESC/POS content
//! let mut builder = EscPosBuilder::new(48);
//! builder.center();
//! builder.double_size();
//! builder.line("RECEIPT");
//! builder.reset_size();
//! builder.sep_double();
//! builder.left();
//! builder.line_lr("Total", "16.50");
//! builder.cut();
//!
//! // Send to network printer
//! let printer = NetworkPrinter::new("192.168.1.100", 9100)?;
//! printer.print(&builder.build()).await?;
//! ```

mod encoding;
mod error;
mod escpos;
mod printer;

// Re-exports
pub use encoding::{SELECT_CP1256, convert_to_cp1256, display_width, pad_width, truncate_width};
pub use error::{PrintError, PrintResult};
pub use escpos::EscPosBuilder;
pub use printer::{NetworkPrinter, Printer};

#[cfg(feature = "image")]
pub use escpos::{process_logo_base64, process_logo_bytes};
