//! Spool watcher
//!
//! The till drops one JSON file per order into the spool directory.
//! Each sweep picks up every `*.json` file, dispatches both tickets,
//! and moves the file to `done/` or `failed/` so nothing is processed
//! twice. A file that fails to move stays in the spool; the dispatch
//! cool-down keeps the immediate re-pickup from printing again.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use sumac_receipt::{
    BothOutcome, DispatchOptions, DispatchOutcome, DispatchReport, EngineResult, PrintDispatcher,
    ReceiptInput,
};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

pub struct SpoolWatcher {
    dispatcher: Arc<PrintDispatcher>,
    spool_dir: PathBuf,
    done_dir: PathBuf,
    failed_dir: PathBuf,
    poll_interval: Duration,
}

impl SpoolWatcher {
    pub fn new(
        dispatcher: Arc<PrintDispatcher>,
        spool_dir: PathBuf,
        done_dir: PathBuf,
        failed_dir: PathBuf,
        poll_interval: Duration,
    ) -> Self {
        Self {
            dispatcher,
            spool_dir,
            done_dir,
            failed_dir,
            poll_interval,
        }
    }

    /// Poll the spool until the token cancels
    pub async fn run(self, token: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(dir = %self.spool_dir.display(), "spool watcher running");
        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("spool watcher stopping");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(e) = self.sweep().await {
                        error!(error = %e, "spool sweep failed");
                    }
                }
            }
        }
    }

    /// One pass over the spool directory
    pub async fn sweep(&self) -> std::io::Result<()> {
        let mut entries = tokio::fs::read_dir(&self.spool_dir).await?;
        let mut batch = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.is_file() && path.extension().and_then(|e| e.to_str()) == Some("json") {
                batch.push(path);
            }
        }
        if batch.is_empty() {
            return Ok(());
        }

        // Oldest naming first; tills name files by order sequence
        batch.sort();
        debug!(count = batch.len(), "orders picked up");

        futures::future::join_all(batch.iter().map(|path| self.process(path))).await;
        Ok(())
    }

    async fn process(&self, path: &Path) {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let bytes = match tokio::fs::read(path).await {
            Ok(b) => b,
            Err(e) => {
                // Probably claimed by a concurrent move, leave it alone
                warn!(%file, error = %e, "order file unreadable, skipping");
                return;
            }
        };

        let input: ReceiptInput = match serde_json::from_slice(&bytes) {
            Ok(i) => i,
            Err(e) => {
                error!(%file, error = %e, "order file is not a valid order");
                self.archive(path, false).await;
                return;
            }
        };

        let outcome = self
            .dispatcher
            .dispatch_both(input, &DispatchOptions::default())
            .await;
        report_leg(&file, "customer", &outcome.customer);
        report_leg(&file, "kitchen", &outcome.kitchen);

        self.archive(path, archive_as_done(&outcome)).await;
    }

    async fn archive(&self, path: &Path, ok: bool) {
        let dest_dir = if ok { &self.done_dir } else { &self.failed_dir };
        let Some(name) = path.file_name() else { return };
        let dest = dest_dir.join(name);
        if let Err(e) = tokio::fs::rename(path, &dest).await {
            error!(
                file = %path.display(),
                error = %e,
                "could not archive order file, it will be picked up again"
            );
        }
    }
}

fn archive_as_done(outcome: &BothOutcome) -> bool {
    // Skipped legs are duplicates of work already done, so they count
    outcome.customer.is_ok() && outcome.kitchen.is_ok()
}

pub(crate) fn report_leg(file: &str, leg: &str, result: &EngineResult<DispatchReport>) {
    match result {
        Ok(report) => match &report.outcome {
            DispatchOutcome::Printed { device, method, copy } => {
                info!(%file, leg, %device, %method, copy = copy.is_copy, "ticket printed");
            }
            DispatchOutcome::Skipped => {
                warn!(%file, leg, "duplicate inside cool-down, skipped");
            }
        },
        Err(e) => {
            error!(%file, leg, error = %e, "ticket failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sumac_receipt::{
        ConnectionKind, EngineConfig, FileSink, MemoryStore, PrinterDevice, PrinterProfile,
        PrinterRole, PrintingContext, ReceiptTemplate, StaticDeviceList,
    };

    fn test_dispatcher(out_dir: &Path) -> Arc<PrintDispatcher> {
        let profiles = vec![
            PrinterProfile {
                name: "EPSON TM-T20III".to_string(),
                role: PrinterRole::Customer,
                model: None,
                connection: ConnectionKind::Network,
                enabled: true,
            },
            PrinterProfile {
                name: "Kitchen XP-80C".to_string(),
                role: PrinterRole::Kitchen,
                model: None,
                connection: ConnectionKind::Network,
                enabled: true,
            },
        ];
        let template = ReceiptTemplate {
            store_name: "Sumac House".to_string(),
            ..ReceiptTemplate::default()
        };
        let devices = vec![
            PrinterDevice::new("EPSON TM-T20III"),
            PrinterDevice::new("Kitchen XP-80C"),
        ];
        Arc::new(PrintDispatcher::new(
            PrintingContext::new(EngineConfig::default()),
            Arc::new(MemoryStore::new(profiles, template)),
            Arc::new(StaticDeviceList::new(devices)),
            Arc::new(FileSink::new(out_dir)),
        ))
    }

    fn watcher(root: &Path, out_dir: &Path) -> SpoolWatcher {
        SpoolWatcher::new(
            test_dispatcher(out_dir),
            root.join("spool"),
            root.join("spool/done"),
            root.join("spool/failed"),
            Duration::from_millis(100),
        )
    }

    async fn setup_dirs(root: &Path) {
        for d in ["spool", "spool/done", "spool/failed", "out"] {
            tokio::fs::create_dir_all(root.join(d)).await.unwrap();
        }
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
    async fn test_sweep_prints_and_archives() {
        let tmp = tempfile::tempdir().unwrap();
        setup_dirs(tmp.path()).await;
        let w = watcher(tmp.path(), &tmp.path().join("out"));

        tokio::fs::write(
            tmp.path().join("spool/order-1001.json"),
            r#"{"orderNumber": "1001", "orderItems": [{"name": "Tea", "quantity": 3, "price": 5.0}], "tax": 1.5}"#,
        )
        .await
        .unwrap();

        w.sweep().await.unwrap();

        // Both tickets spooled by the file sink
        assert_eq!(file_count(&tmp.path().join("out")).await, 2);
        // Order file archived as done
        assert_eq!(file_count(&tmp.path().join("spool/done")).await, 1);
        assert_eq!(file_count(&tmp.path().join("spool/failed")).await, 0);
    }

    #[tokio::test]
    async fn test_sweep_rejects_malformed_order() {
        let tmp = tempfile::tempdir().unwrap();
        setup_dirs(tmp.path()).await;
        let w = watcher(tmp.path(), &tmp.path().join("out"));

        tokio::fs::write(tmp.path().join("spool/broken.json"), b"not json at all")
            .await
            .unwrap();

        w.sweep().await.unwrap();

        assert_eq!(file_count(&tmp.path().join("out")).await, 0);
        assert_eq!(file_count(&tmp.path().join("spool/failed")).await, 1);
    }

    #[tokio::test]
    async fn test_sweep_ignores_foreign_files() {
        let tmp = tempfile::tempdir().unwrap();
        setup_dirs(tmp.path()).await;
        let w = watcher(tmp.path(), &tmp.path().join("out"));

        tokio::fs::write(tmp.path().join("spool/notes.txt"), b"ignore me")
            .await
            .unwrap();

        w.sweep().await.unwrap();

        assert_eq!(file_count(&tmp.path().join("out")).await, 0);
        // Still where it was
        assert!(tmp.path().join("spool/notes.txt").exists());
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let tmp = tempfile::tempdir().unwrap();
        setup_dirs(tmp.path()).await;
        let w = watcher(tmp.path(), &tmp.path().join("out"));

        let token = CancellationToken::new();
        let handle = tokio::spawn(w.run(token.clone()));

        tokio::time::sleep(Duration::from_millis(50)).await;
        token.cancel();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("watcher did not stop")
            .unwrap();
    }
}
