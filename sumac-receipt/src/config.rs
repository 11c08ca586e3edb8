//! Engine configuration, printer profiles and receipt templates
//!
//! Profiles and templates are owned by a settings surface elsewhere; this
//! module only reads them. Reads go through the [`ProfileStore`] trait so
//! tests and embedders can swap the durable JSON file for an in-memory
//! variant.

use crate::error::EngineResult;
use crate::receipt::PrinterRole;
use crate::select::RenderMethod;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Engine-wide tunables
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Window during which duplicate job keys are dropped
    pub cool_down: Duration,
    /// Deadline on a single print sink submission
    pub submit_timeout: Duration,
    /// Copy-tracker entries idle longer than this are pruned
    pub copy_ttl: Duration,
    /// Rendering method for plain-script content
    pub default_method: RenderMethod,
    /// TrueType font for the raster path; the builtin bitmap font is
    /// used when unset or unreadable
    pub font_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cool_down: Duration::from_secs(3),
            submit_timeout: Duration::from_secs(10),
            copy_ttl: Duration::from_secs(24 * 60 * 60),
            default_method: RenderMethod::Html,
            font_path: None,
        }
    }
}

/// Physical paper geometry handed to the print sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaperSpec {
    pub width_mm: u8,
    /// Printable columns at normal font size
    pub columns: usize,
    /// Printable dots per raster line
    pub dots_per_line: u32,
}

impl PaperSpec {
    pub fn mm58() -> Self {
        Self {
            width_mm: 58,
            columns: 32,
            dots_per_line: 384,
        }
    }

    pub fn mm80() -> Self {
        Self {
            width_mm: 80,
            columns: 48,
            dots_per_line: 576,
        }
    }

    /// Geometry for a detected column count
    pub fn from_columns(columns: usize) -> Self {
        if columns <= 32 { Self::mm58() } else { Self::mm80() }
    }
}

impl Default for PaperSpec {
    fn default() -> Self {
        Self::mm80()
    }
}

// ============================================================================
// Printer profiles
// ============================================================================

/// How a profile's device is attached
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Network,
    Usb,
    Driver,
}

/// Logical printer configuration, persisted by the settings surface
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterProfile {
    /// Configured device name, matched against enumerated devices
    pub name: String,
    pub role: PrinterRole,
    /// Vendor/model tag used as a matching fallback (e.g. "TM-T20")
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default = "default_connection")]
    pub connection: ConnectionKind,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_connection() -> ConnectionKind {
    ConnectionKind::Network
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Receipt template
// ============================================================================

/// Store identity and fixed receipt text
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptTemplate {
    pub store_name: String,
    pub store_name_localized: Option<String>,
    pub address: Option<String>,
    pub address_localized: Option<String>,
    pub phone: Option<String>,
    pub tax_id: Option<String>,
    /// ASCII currency code for plain-script receipts
    pub currency_code: String,
    /// Localized currency label for Arabic receipts
    pub currency_localized: String,
    pub thank_you: String,
    pub extra_footer: Option<String>,
    /// Inline logo image, base64-encoded PNG/JPEG
    pub logo_base64: Option<String>,
    /// Rendered as a QR code at the receipt foot when present
    pub qr_data: Option<String>,
    /// Pulse the cash drawer when a cash payment is on the original
    pub kick_drawer: bool,
}

impl Default for ReceiptTemplate {
    fn default() -> Self {
        Self {
            store_name: String::new(),
            store_name_localized: None,
            address: None,
            address_localized: None,
            phone: None,
            tax_id: None,
            currency_code: "SAR".to_string(),
            currency_localized: "ر.س".to_string(),
            thank_you: "Thank you for your visit!".to_string(),
            extra_footer: None,
            logo_base64: None,
            qr_data: None,
            kick_drawer: true,
        }
    }
}

/// On-disk settings document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PrintingSettings {
    #[serde(default)]
    pub profiles: Vec<PrinterProfile>,
    #[serde(default)]
    pub template: ReceiptTemplate,
}

// ============================================================================
// Store access
// ============================================================================

/// Read access to durable printing settings
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn load_profiles(&self) -> EngineResult<Vec<PrinterProfile>>;
    async fn load_template(&self) -> EngineResult<ReceiptTemplate>;
}

/// Settings held in memory, for tests and embedders
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    settings: PrintingSettings,
}

impl MemoryStore {
    pub fn new(profiles: Vec<PrinterProfile>, template: ReceiptTemplate) -> Self {
        Self {
            settings: PrintingSettings { profiles, template },
        }
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn load_profiles(&self) -> EngineResult<Vec<PrinterProfile>> {
        Ok(self.settings.profiles.clone())
    }

    async fn load_template(&self) -> EngineResult<ReceiptTemplate> {
        Ok(self.settings.template.clone())
    }
}

/// Settings persisted as a JSON document
///
/// The file is re-read on every load, so edits made by the settings
/// surface take effect on the next dispatch without a restart.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    async fn read(&self) -> EngineResult<PrintingSettings> {
        let bytes = tokio::fs::read(&self.path).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl ProfileStore for JsonFileStore {
    async fn load_profiles(&self) -> EngineResult<Vec<PrinterProfile>> {
        Ok(self.read().await?.profiles)
    }

    async fn load_template(&self) -> EngineResult<ReceiptTemplate> {
        Ok(self.read().await?.template)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_defaults() {
        let p: PrinterProfile = serde_json::from_str(
            r#"{"name": "EPSON TM-T20III", "role": "customer"}"#,
        )
        .unwrap();
        assert!(p.enabled);
        assert_eq!(p.connection, ConnectionKind::Network);
        assert!(p.model.is_none());
    }

    #[test]
    fn test_paper_spec_from_columns() {
        assert_eq!(PaperSpec::from_columns(32), PaperSpec::mm58());
        assert_eq!(PaperSpec::from_columns(48), PaperSpec::mm80());
    }

    #[tokio::test]
    async fn test_json_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printing.json");

        let settings = PrintingSettings {
            profiles: vec![PrinterProfile {
                name: "Kitchen XP-80C".to_string(),
                role: PrinterRole::Kitchen,
                model: Some("XP-80".to_string()),
                connection: ConnectionKind::Network,
                enabled: true,
            }],
            template: ReceiptTemplate {
                store_name: "Sumac House".to_string(),
                ..ReceiptTemplate::default()
            },
        };
        std::fs::write(&path, serde_json::to_vec_pretty(&settings).unwrap()).unwrap();

        let store = JsonFileStore::new(&path);
        let profiles = store.load_profiles().await.unwrap();
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].role, PrinterRole::Kitchen);

        let template = store.load_template().await.unwrap();
        assert_eq!(template.store_name, "Sumac House");
        assert_eq!(template.currency_code, "SAR");
    }

    #[tokio::test]
    async fn test_json_file_store_missing_file() {
        let store = JsonFileStore::new("/nonexistent/printing.json");
        assert!(store.load_profiles().await.is_err());
    }
}
