//! Printer capability registry
//!
//! There is no live capability probe for thermal printers, so flags are
//! derived from device-name heuristics and optimistic defaults: a device
//! is assumed to handle rich markup and rasterized images unless its name
//! proves otherwise. Entries live in an in-memory map keyed by device
//! name; re-registering overwrites (last write wins) and nothing expires.

use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Vendor family recognized from the device name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VendorFamily {
    Epson,
    Xprinter,
    Star,
    Unknown,
}

/// What a device is believed to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capability {
    pub supports_markup: bool,
    pub supports_raster: bool,
    /// Printable columns at normal font size
    pub columns: usize,
    pub vendor: VendorFamily,
}

/// Derive capability flags from a device name
///
/// Pure heuristics, independent of any live device list.
pub fn detect_capability(device_name: &str) -> Capability {
    let upper = device_name.to_uppercase();

    let vendor = if upper.contains("EPSON") || upper.contains("TM-") {
        VendorFamily::Epson
    } else if upper.contains("XPRINTER") || upper.contains("XP-") {
        VendorFamily::Xprinter
    } else if upper.contains("STAR") || upper.contains("TSP") {
        VendorFamily::Star
    } else {
        VendorFamily::Unknown
    };

    // Text-only driver names are the one case we downgrade
    let text_only = upper.contains("GENERIC") || upper.contains("TEXT ONLY");

    // 58mm models usually carry "58" in the name; everything else is 80mm
    let columns = if upper.contains("58") { 32 } else { 48 };

    Capability {
        supports_markup: !text_only,
        supports_raster: !text_only,
        columns,
        vendor,
    }
}

/// In-memory capability map, keyed by device name
#[derive(Debug, Clone, Default)]
pub struct CapabilityRegistry {
    devices: Arc<DashMap<String, Capability>>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detect and store capabilities for a discovered device
    pub fn register(&self, device_name: &str) -> Capability {
        let capability = detect_capability(device_name);
        debug!(device = device_name, ?capability, "registered printer capability");
        self.devices.insert(device_name.to_string(), capability);
        capability
    }

    pub fn get(&self, device_name: &str) -> Option<Capability> {
        self.devices.get(device_name).map(|c| *c)
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_detection() {
        assert_eq!(detect_capability("EPSON TM-T20III").vendor, VendorFamily::Epson);
        assert_eq!(detect_capability("Xprinter XP-80C").vendor, VendorFamily::Xprinter);
        assert_eq!(detect_capability("Star TSP143").vendor, VendorFamily::Star);
        assert_eq!(detect_capability("POS-80 Printer").vendor, VendorFamily::Unknown);
    }

    #[test]
    fn test_unknown_defaults_to_capable() {
        let cap = detect_capability("Some Random Device");
        assert!(cap.supports_markup);
        assert!(cap.supports_raster);
        assert_eq!(cap.columns, 48);
    }

    #[test]
    fn test_text_only_downgrade() {
        let cap = detect_capability("Generic / Text Only");
        assert!(!cap.supports_markup);
        assert!(!cap.supports_raster);
    }

    #[test]
    fn test_narrow_paper_detection() {
        assert_eq!(detect_capability("XP-58IIH").columns, 32);
        assert_eq!(detect_capability("EPSON TM-T20III").columns, 48);
    }

    #[test]
    fn test_registry_last_write_wins() {
        let registry = CapabilityRegistry::new();
        registry.register("EPSON TM-T20III");
        registry.register("EPSON TM-T20III");
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("EPSON TM-T20III").map(|c| c.vendor),
            Some(VendorFamily::Epson)
        );
        assert!(registry.get("unknown").is_none());
    }
}
