//! Sumac Print Station
//!
//! Runnable deployment of the receipt pipeline: watches a spool
//! directory for order files dropped by the till and prints the
//! customer receipt and kitchen ticket for each.
//!
//! # Module structure
//!
//! ```text
//! sumac-station/src/
//! ├── config/   # Environment-driven configuration
//! ├── logging/  # Console + rotating file output
//! ├── station/  # Pipeline assembly and lifecycle
//! └── spool/    # Order file pickup loop
//! ```

pub mod config;
pub mod logging;
pub mod spool;
pub mod station;

pub use config::{SinkKind, StationConfig};
pub use spool::SpoolWatcher;
pub use station::{JsonDeviceFile, Station};

/// Load `.env` and initialize logging
///
/// Must run before configuration so overrides from the `.env` file are
/// visible to [`StationConfig::from_env`].
pub fn setup_environment() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    logging::init(log_dir.as_deref());
    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   _____
  / ___/__  ______ ___  ____ ______
  \__ \/ / / / __ `__ \/ __ `/ ___/
 ___/ / /_/ / / / / / / /_/ / /__
/____/\__,_/_/ /_/ /_/\__,_/\___/
    "#
    );
}
