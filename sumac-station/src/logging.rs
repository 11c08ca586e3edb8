//! Logging setup
//!
//! Console output by default; daily-rotated files when a log directory
//! is configured. `RUST_LOG` overrides the `info` default filter.

use std::path::Path;
use tracing_subscriber::EnvFilter;

pub fn init(log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    if let Some(dir) = log_dir {
        if Path::new(dir).exists() {
            let file_appender = tracing_appender::rolling::daily(dir, "sumac-station");
            builder.with_writer(file_appender).with_ansi(false).init();
            return;
        }
        eprintln!("LOG_DIR '{dir}' does not exist, logging to console");
    }

    builder.init();
}
