//! Receipt pipeline: WHAT to print and WHERE to send it
//!
//! Takes raw front-of-house order payloads to printed tickets:
//!
//! ```text
//! ReceiptInput --normalize--> Receipt
//!       |                        |
//!       |                 classify (Arabic?)
//!       v                        v
//!   resolve device ----> select method (html / canvas / raw)
//!       |                        |
//!   dedup claim             render payload
//!       |                        |
//!       +-----> PrintSink <------+
//! ```
//!
//! The companion crate `sumac-printer` owns the HOW: ESC/POS byte
//! building, Windows-1256 text, raster framing and the TCP transport.
//!
//! Stateful pieces (copy tracking, job dedup, capability cache) live in
//! [`PrintingContext`]; settings, device enumeration and transport are
//! injected as traits, so the pipeline runs unchanged against a till,
//! a spool directory, or test fakes.

pub mod capability;
pub mod classify;
pub mod config;
pub mod copies;
pub mod devices;
pub mod dispatch;
pub mod error;
pub mod format;
pub mod money;
pub mod queue;
pub mod receipt;
pub mod render;
pub mod resolve;
pub mod select;
pub mod shape;
pub mod sink;

pub use capability::{Capability, CapabilityRegistry, VendorFamily, detect_capability};
pub use classify::has_bidi_content;
pub use config::{
    ConnectionKind, EngineConfig, JsonFileStore, MemoryStore, PaperSpec, PrinterProfile,
    PrintingSettings, ProfileStore, ReceiptTemplate,
};
pub use copies::CopyTracker;
pub use devices::{DeviceEnumerator, PrinterDevice, StaticDeviceList};
pub use dispatch::{
    BothOutcome, DispatchOptions, DispatchOutcome, DispatchReport, PrintDispatcher,
    PrintingContext,
};
pub use error::{EngineError, EngineResult};
pub use queue::{JobDeduplicator, JobKey};
pub use receipt::{OrderType, PrinterRole, Receipt, ReceiptInput};
pub use render::raster::RasterFont;
pub use render::{CopyInfo, RasterImage, RenderedPayload};
pub use resolve::{MatchStrategy, ResolvedPrinter, resolve};
pub use select::{RenderMethod, select_method};
pub use sink::{EscposNetworkSink, FileSink, PrintJob, PrintSink};
