//! Station assembly
//!
//! Wires the pipeline together from configuration: settings store,
//! device list, sink, dispatcher, spool watcher.

use crate::config::{SinkKind, StationConfig};
use crate::spool::{SpoolWatcher, report_leg};
use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use sumac_printer::{NetworkPrinter, Printer};
use sumac_receipt::{
    DeviceEnumerator, DispatchOptions, EngineResult, EscposNetworkSink, FileSink, JsonFileStore,
    PrintDispatcher, PrintSink, PrinterDevice, PrintingContext, ReceiptInput,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Device list persisted as a JSON document
///
/// Re-read on every enumeration so device edits take effect on the
/// next dispatch without a restart. Devices carrying a network address
/// get a quick reachability probe on top of the recorded online flag;
/// the rest are taken at face value.
pub struct JsonDeviceFile {
    path: PathBuf,
}

impl JsonDeviceFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DeviceEnumerator for JsonDeviceFile {
    async fn enumerate(&self) -> EngineResult<Vec<PrinterDevice>> {
        let bytes = tokio::fs::read(&self.path).await?;
        let mut devices: Vec<PrinterDevice> = serde_json::from_slice(&bytes)?;

        // Probes run concurrently; each is capped well below the poll
        // interval so a dead printer cannot stall enumeration.
        let probes = devices.iter().map(|device| async {
            match device.address.as_deref().map(NetworkPrinter::from_addr) {
                Some(Ok(printer)) => Some(printer.is_online().await),
                _ => None,
            }
        });
        let results = futures::future::join_all(probes).await;

        for (device, probed) in devices.iter_mut().zip(results) {
            if let Some(online) = probed {
                device.online = online;
            }
        }
        Ok(devices)
    }
}

/// The running print station
pub struct Station {
    dispatcher: Arc<PrintDispatcher>,
    config: StationConfig,
}

impl Station {
    /// Build the pipeline and prepare the working directories
    pub async fn initialize(config: &StationConfig) -> anyhow::Result<Self> {
        for dir in [config.spool_dir(), config.done_dir(), config.failed_dir()] {
            tokio::fs::create_dir_all(&dir)
                .await
                .with_context(|| format!("creating {}", dir.display()))?;
        }

        let store = Arc::new(JsonFileStore::new(&config.settings_path));
        let enumerator = Arc::new(JsonDeviceFile::new(&config.devices_path));

        let sink: Arc<dyn PrintSink> = match config.sink {
            SinkKind::Network => {
                info!("sink: ESC/POS over TCP");
                Arc::new(EscposNetworkSink::new())
            }
            SinkKind::File => {
                tokio::fs::create_dir_all(&config.out_dir)
                    .await
                    .with_context(|| format!("creating {}", config.out_dir.display()))?;
                info!(dir = %config.out_dir.display(), "sink: file spool");
                Arc::new(FileSink::new(&config.out_dir))
            }
        };

        let ctx = PrintingContext::new(config.engine_config());
        let dispatcher = Arc::new(PrintDispatcher::new(ctx, store, enumerator.clone(), sink));

        // Warm the capability cache so the first order does not pay for
        // detection; failures here are setup problems the operator can
        // fix while the station runs
        match enumerator.enumerate().await {
            Ok(devices) => {
                for device in &devices {
                    dispatcher.context().capabilities.register(&device.name);
                }
                info!(count = devices.len(), "devices registered");
            }
            Err(e) => warn!(
                path = %config.devices_path.display(),
                error = %e,
                "device list unavailable, will retry per dispatch"
            ),
        }

        info!(
            spool = %config.spool_dir().display(),
            settings = %config.settings_path.display(),
            "station ready"
        );

        Ok(Self {
            dispatcher,
            config: config.clone(),
        })
    }

    /// Print one order file immediately and return
    ///
    /// One-shot mode for smoke-testing a setup or re-running an
    /// archived order. The file stays where it is.
    pub async fn print_file(&self, path: &Path) -> anyhow::Result<()> {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading {}", path.display()))?;
        let input: ReceiptInput = serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing {}", path.display()))?;

        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let outcome = self
            .dispatcher
            .dispatch_both(input, &DispatchOptions::default())
            .await;
        report_leg(&file, "customer", &outcome.customer);
        report_leg(&file, "kitchen", &outcome.kitchen);

        if outcome.customer.is_err() || outcome.kitchen.is_err() {
            anyhow::bail!("one or both tickets failed for {}", file);
        }
        Ok(())
    }

    /// Watch the spool until interrupted
    pub async fn run(self) -> anyhow::Result<()> {
        let token = CancellationToken::new();
        let watcher = SpoolWatcher::new(
            Arc::clone(&self.dispatcher),
            self.config.spool_dir(),
            self.config.done_dir(),
            self.config.failed_dir(),
            self.config.poll_interval,
        );

        let watch_task = tokio::spawn(watcher.run(token.clone()));

        tokio::signal::ctrl_c()
            .await
            .context("listening for shutdown signal")?;
        info!("shutdown signal received");
        token.cancel();

        watch_task.await.context("spool watcher panicked")?;
        info!("station stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use sumac_receipt::RenderMethod;

    fn file_config(root: &Path) -> StationConfig {
        StationConfig {
            work_dir: root.to_path_buf(),
            settings_path: root.join("printing.json"),
            devices_path: root.join("devices.json"),
            font_path: None,
            sink: SinkKind::File,
            out_dir: root.join("out"),
            poll_interval: Duration::from_millis(100),
            cool_down: Duration::from_millis(300),
            submit_timeout: Duration::from_secs(5),
            copy_ttl: Duration::from_secs(60),
            default_method: RenderMethod::Html,
        }
    }

    async fn write_working_files(root: &Path) {
        tokio::fs::write(
            root.join("printing.json"),
            r#"{
                "profiles": [
                    {"name": "EPSON TM-T20III", "role": "customer"},
                    {"name": "Kitchen XP-80C", "role": "kitchen"}
                ],
                "template": {"store_name": "Sumac House"}
            }"#,
        )
        .await
        .unwrap();
        tokio::fs::write(
            root.join("devices.json"),
            r#"[{"name": "EPSON TM-T20III"}, {"name": "Kitchen XP-80C"}]"#,
        )
        .await
        .unwrap();
    }

    async fn file_count(dir: &Path) -> usize {
        let mut entries = tokio::fs::read_dir(dir).await.unwrap();
        let mut n = 0;
        while entries.next_entry().await.unwrap().is_some() {
            n += 1;
        }
        n
    }

    #[tokio::test]
    async fn test_one_shot_print_file() {
        let tmp = tempfile::tempdir().unwrap();
        write_working_files(tmp.path()).await;

        let order = tmp.path().join("order-1001.json");
        tokio::fs::write(
            &order,
            r#"{"orderNumber": "1001", "orderItems": [{"name": "Tea", "quantity": 3, "price": 5.0}], "tax": 1.5}"#,
        )
        .await
        .unwrap();

        let station = Station::initialize(&file_config(tmp.path())).await.unwrap();
        station.print_file(&order).await.unwrap();

        // Both tickets landed in the file sink, order file untouched
        assert_eq!(file_count(&tmp.path().join("out")).await, 2);
        assert!(order.exists());
    }

    #[tokio::test]
    async fn test_one_shot_rejects_malformed_order() {
        let tmp = tempfile::tempdir().unwrap();
        write_working_files(tmp.path()).await;

        let order = tmp.path().join("broken.json");
        tokio::fs::write(&order, b"not json at all").await.unwrap();

        let station = Station::initialize(&file_config(tmp.path())).await.unwrap();
        assert!(station.print_file(&order).await.is_err());
        assert_eq!(file_count(&tmp.path().join("out")).await, 0);
    }

    #[tokio::test]
    async fn test_enumerate_probes_addressed_devices() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("devices.json");
        // Port 1 on loopback refuses or times out, never accepts
        tokio::fs::write(
            &path,
            r#"[
                {"name": "EPSON TM-T20III", "address": "127.0.0.1:1", "online": true},
                {"name": "Microsoft Print to PDF"}
            ]"#,
        )
        .await
        .unwrap();

        let devices = JsonDeviceFile::new(&path).enumerate().await.unwrap();
        assert_eq!(devices.len(), 2);
        // The probe overrides the recorded flag for addressed devices
        assert!(!devices[0].online);
        // No address means no probe, the file's value stands
        assert!(devices[1].online);
    }
}
