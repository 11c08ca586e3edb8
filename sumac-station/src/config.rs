use std::path::PathBuf;
use std::time::Duration;
use sumac_receipt::{EngineConfig, RenderMethod};

/// Station configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | /var/lib/sumac/station | Base directory for spool, settings and output |
/// | SETTINGS_PATH | {WORK_DIR}/printing.json | Printer profiles and receipt template |
/// | DEVICES_PATH | {WORK_DIR}/devices.json | Known physical devices |
/// | FONT_PATH | unset | TrueType font for rasterized receipts |
/// | SINK | network | `network` (port 9100) or `file` (spool to disk) |
/// | OUT_DIR | {WORK_DIR}/out | Output directory for the file sink |
/// | POLL_INTERVAL_MS | 500 | Spool directory scan interval |
/// | COOL_DOWN_MS | 3000 | Duplicate-job window |
/// | SUBMIT_TIMEOUT_MS | 10000 | Deadline for one sink submission |
/// | COPY_TTL_HOURS | 24 | Idle time before reprint history is dropped |
/// | DEFAULT_METHOD | html | Rendering for plain-script content: html, canvas, raw |
/// | LOG_DIR | unset | Daily-rotated log files land here when set |
#[derive(Debug, Clone)]
pub struct StationConfig {
    /// Base directory for spool, settings and output
    pub work_dir: PathBuf,
    /// Printer profiles and receipt template document
    pub settings_path: PathBuf,
    /// Known physical devices document
    pub devices_path: PathBuf,
    /// TrueType font for rasterized receipts
    pub font_path: Option<PathBuf>,
    /// Destination for finished payloads
    pub sink: SinkKind,
    /// Output directory for [`SinkKind::File`]
    pub out_dir: PathBuf,
    /// Spool directory scan interval
    pub poll_interval: Duration,
    pub cool_down: Duration,
    pub submit_timeout: Duration,
    pub copy_ttl: Duration,
    pub default_method: RenderMethod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    /// Raw TCP to port-9100 printers
    Network,
    /// Spool payloads to disk (previews, printerless setups)
    File,
}

impl StationConfig {
    /// Load configuration from environment variables, with defaults
    /// for everything unset
    pub fn from_env() -> Self {
        let work_dir = PathBuf::from(
            std::env::var("WORK_DIR").unwrap_or_else(|_| "/var/lib/sumac/station".into()),
        );
        let settings_path = std::env::var("SETTINGS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| work_dir.join("printing.json"));
        let devices_path = std::env::var("DEVICES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| work_dir.join("devices.json"));
        let out_dir = std::env::var("OUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| work_dir.join("out"));

        let sink = match std::env::var("SINK").as_deref() {
            Ok("file") => SinkKind::File,
            _ => SinkKind::Network,
        };

        Self {
            work_dir,
            settings_path,
            devices_path,
            font_path: std::env::var("FONT_PATH").ok().map(PathBuf::from),
            sink,
            out_dir,
            poll_interval: millis_var("POLL_INTERVAL_MS", 500),
            cool_down: millis_var("COOL_DOWN_MS", 3_000),
            submit_timeout: millis_var("SUBMIT_TIMEOUT_MS", 10_000),
            copy_ttl: Duration::from_secs(
                std::env::var("COPY_TTL_HOURS")
                    .ok()
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(24)
                    * 60
                    * 60,
            ),
            default_method: std::env::var("DEFAULT_METHOD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(RenderMethod::Html),
        }
    }

    pub fn spool_dir(&self) -> PathBuf {
        self.work_dir.join("spool")
    }

    pub fn done_dir(&self) -> PathBuf {
        self.spool_dir().join("done")
    }

    pub fn failed_dir(&self) -> PathBuf {
        self.spool_dir().join("failed")
    }

    /// Pipeline tunables derived from this configuration
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            cool_down: self.cool_down,
            submit_timeout: self.submit_timeout,
            copy_ttl: self.copy_ttl,
            default_method: self.default_method,
            font_path: self.font_path.clone(),
        }
    }
}

impl Default for StationConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

fn millis_var(name: &str, default: u64) -> Duration {
    Duration::from_millis(
        std::env::var(name)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}
