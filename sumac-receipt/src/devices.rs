//! Physical device enumeration
//!
//! The engine never caches the device list; every dispatch re-queries the
//! enumerator so hot-plugged or removed printers are reflected naturally.

use crate::error::EngineResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// An addressable device as reported by enumeration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterDevice {
    /// System-visible device name
    pub name: String,
    #[serde(default)]
    pub model: Option<String>,
    /// "host:port" for raw network printing
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default = "default_true")]
    pub online: bool,
}

fn default_true() -> bool {
    true
}

impl PrinterDevice {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: None,
            address: None,
            online: true,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn offline(mut self) -> Self {
        self.online = false;
        self
    }
}

/// Source of the current device list
#[async_trait]
pub trait DeviceEnumerator: Send + Sync {
    async fn enumerate(&self) -> EngineResult<Vec<PrinterDevice>>;
}

/// Fixed device list, for configuration-driven deployments and tests
#[derive(Debug, Clone, Default)]
pub struct StaticDeviceList {
    devices: Vec<PrinterDevice>,
}

impl StaticDeviceList {
    pub fn new(devices: Vec<PrinterDevice>) -> Self {
        Self { devices }
    }
}

#[async_trait]
impl DeviceEnumerator for StaticDeviceList {
    async fn enumerate(&self) -> EngineResult<Vec<PrinterDevice>> {
        Ok(self.devices.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_serde_defaults() {
        let d: PrinterDevice = serde_json::from_str(r#"{"name": "EPSON TM-T20III"}"#).unwrap();
        assert!(d.online);
        assert!(d.address.is_none());
    }

    #[tokio::test]
    async fn test_static_list() {
        let list = StaticDeviceList::new(vec![
            PrinterDevice::new("EPSON TM-T20III").with_address("192.168.1.50:9100"),
        ]);
        let devices = list.enumerate().await.unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].address.as_deref(), Some("192.168.1.50:9100"));
    }
}
