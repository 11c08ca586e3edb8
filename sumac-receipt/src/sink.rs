//! Print sinks
//!
//! A sink takes a finished payload to a destination: a socket, a spool
//! directory, or a fake in tests. The dispatcher only sees the trait,
//! so transport never leaks into pipeline logic.

use crate::config::PaperSpec;
use crate::devices::PrinterDevice;
use crate::error::{EngineError, EngineResult};
use crate::render::{RasterImage, RenderedPayload};
use async_trait::async_trait;
use std::path::PathBuf;
use sumac_printer::{EscPosBuilder, PrintError, Printer};
use tracing::{info, instrument};
use uuid::Uuid;

/// One fully rendered job bound to a physical device
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub device: PrinterDevice,
    pub paper: PaperSpec,
    pub payload: RenderedPayload,
}

/// Destination for finished payloads
#[async_trait]
pub trait PrintSink: Send + Sync {
    async fn submit(&self, job: &PrintJob) -> EngineResult<()>;
}

// ============================================================================
// ESC/POS over TCP
// ============================================================================

/// Sends jobs to port-9100 thermal printers
///
/// Raw payloads go out untouched; raster payloads get wrapped in a
/// GS v 0 stream. Markup payloads have no byte representation a
/// thermal printer understands and are rejected.
#[derive(Debug, Clone, Default)]
pub struct EscposNetworkSink;

impl EscposNetworkSink {
    pub fn new() -> Self {
        Self
    }

    fn wrap_raster(paper: PaperSpec, img: &RasterImage) -> Vec<u8> {
        let mut b = EscPosBuilder::new(paper.columns);
        b.raster(img.width, img.height, &img.rows).cut_feed(3);
        // No text in this stream, so no code page pass. Running one
        // would mangle high row bytes.
        b.build_raw()
    }
}

#[async_trait]
impl PrintSink for EscposNetworkSink {
    #[instrument(skip(self, job), fields(device = %job.device.name, kind = job.payload.kind()))]
    async fn submit(&self, job: &PrintJob) -> EngineResult<()> {
        if !job.device.online {
            return Err(EngineError::Sink(PrintError::Offline(
                job.device.name.clone(),
            )));
        }

        let bytes = match &job.payload {
            RenderedPayload::RawBytes(bytes) => bytes.clone(),
            RenderedPayload::Image(img) => Self::wrap_raster(job.paper, img),
            RenderedPayload::Markup(_) => {
                return Err(EngineError::Unsupported(
                    "markup payloads need a browser-backed sink".to_string(),
                ));
            }
        };

        let printer = NetworkPrinterFor::lookup(&job.device)?;
        printer.print(&bytes).await?;
        info!(bytes = bytes.len(), "payload sent");
        Ok(())
    }
}

/// Address resolution for network devices
struct NetworkPrinterFor;

impl NetworkPrinterFor {
    fn lookup(device: &PrinterDevice) -> EngineResult<sumac_printer::NetworkPrinter> {
        let address = device.address.as_deref().ok_or_else(|| {
            EngineError::InvalidProfile(format!("device '{}' has no network address", device.name))
        })?;
        Ok(sumac_printer::NetworkPrinter::from_addr(address)?)
    }
}

// ============================================================================
// File spool
// ============================================================================

/// Writes payloads into a spool directory
///
/// Used by the station's preview flow and anywhere a physical device
/// is out of reach. Markup lands as `.html`, rasters as `.png`, raw
/// streams as `.bin`.
#[derive(Debug, Clone)]
pub struct FileSink {
    dir: PathBuf,
}

impl FileSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn file_name(device: &PrinterDevice, ext: &str) -> String {
        let safe: String = device
            .name
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        format!("{}-{}.{}", safe, Uuid::new_v4(), ext)
    }

    fn encode_png(img: &RasterImage) -> EngineResult<Vec<u8>> {
        let bytes_per_row = img.bytes_per_row();
        let gray = image::GrayImage::from_fn(img.width, img.height, |x, y| {
            let byte = img.rows[y as usize * bytes_per_row + (x / 8) as usize];
            let black = byte & (0x80 >> (x % 8)) != 0;
            image::Luma([if black { 0u8 } else { 255u8 }])
        });

        let mut png = Vec::new();
        gray.write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| EngineError::Render(format!("png encode failed: {e}")))?;
        Ok(png)
    }
}

#[async_trait]
impl PrintSink for FileSink {
    #[instrument(skip(self, job), fields(device = %job.device.name, kind = job.payload.kind()))]
    async fn submit(&self, job: &PrintJob) -> EngineResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let (name, bytes) = match &job.payload {
            RenderedPayload::Markup(html) => (
                Self::file_name(&job.device, "html"),
                html.as_bytes().to_vec(),
            ),
            RenderedPayload::Image(img) => {
                (Self::file_name(&job.device, "png"), Self::encode_png(img)?)
            }
            RenderedPayload::RawBytes(raw) => (Self::file_name(&job.device, "bin"), raw.clone()),
        };

        let path = self.dir.join(name);
        tokio::fs::write(&path, &bytes).await?;
        info!(path = %path.display(), bytes = bytes.len(), "payload spooled");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device() -> PrinterDevice {
        PrinterDevice::new("EPSON TM-T20III")
    }

    fn job(payload: RenderedPayload) -> PrintJob {
        PrintJob {
            device: device(),
            paper: PaperSpec::mm80(),
            payload,
        }
    }

    async fn spooled_files(dir: &std::path::Path) -> Vec<PathBuf> {
        let mut entries = tokio::fs::read_dir(dir).await.unwrap();
        let mut paths = Vec::new();
        while let Some(e) = entries.next_entry().await.unwrap() {
            paths.push(e.path());
        }
        paths
    }

    #[tokio::test]
    async fn test_file_sink_markup() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());

        sink.submit(&job(RenderedPayload::Markup("<html>receipt</html>".to_string())))
            .await
            .unwrap();

        let files = spooled_files(dir.path()).await;
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].extension().unwrap(), "html");
        let content = tokio::fs::read_to_string(&files[0]).await.unwrap();
        assert_eq!(content, "<html>receipt</html>");
    }

    #[tokio::test]
    async fn test_file_sink_raw() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());

        sink.submit(&job(RenderedPayload::RawBytes(vec![0x1B, 0x40, b'h', b'i'])))
            .await
            .unwrap();

        let files = spooled_files(dir.path()).await;
        assert_eq!(files[0].extension().unwrap(), "bin");
        let content = tokio::fs::read(&files[0]).await.unwrap();
        assert_eq!(content, vec![0x1B, 0x40, b'h', b'i']);
    }

    #[tokio::test]
    async fn test_file_sink_image_round_trips_png() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FileSink::new(dir.path());

        // 16x2: first row all black, second all white
        let img = RasterImage {
            width: 16,
            height: 2,
            rows: vec![0xFF, 0xFF, 0x00, 0x00],
        };
        sink.submit(&job(RenderedPayload::Image(img))).await.unwrap();

        let files = spooled_files(dir.path()).await;
        assert_eq!(files[0].extension().unwrap(), "png");

        let decoded = image::open(&files[0]).unwrap().to_luma8();
        assert_eq!(decoded.dimensions(), (16, 2));
        assert_eq!(decoded.get_pixel(0, 0).0[0], 0);
        assert_eq!(decoded.get_pixel(0, 1).0[0], 255);
    }

    #[tokio::test]
    async fn test_network_sink_rejects_markup() {
        let sink = EscposNetworkSink::new();
        let mut j = job(RenderedPayload::Markup("<html></html>".to_string()));
        j.device = PrinterDevice::new("EPSON TM-T20III").with_address("127.0.0.1:9100");

        let err = sink.submit(&j).await.unwrap_err();
        assert!(matches!(err, EngineError::Unsupported(_)));
    }

    #[tokio::test]
    async fn test_network_sink_fails_fast_when_offline() {
        let sink = EscposNetworkSink::new();
        let mut j = job(RenderedPayload::RawBytes(vec![0x1B, 0x40]));
        j.device = PrinterDevice::new("EPSON TM-T20III")
            .with_address("10.255.255.1:9100")
            .offline();

        let err = sink.submit(&j).await.unwrap_err();
        assert!(matches!(err, EngineError::Sink(PrintError::Offline(_))));
    }

    #[tokio::test]
    async fn test_network_sink_requires_address() {
        let sink = EscposNetworkSink::new();
        let j = job(RenderedPayload::RawBytes(vec![0x1B, 0x40]));

        let err = sink.submit(&j).await.unwrap_err();
        assert!(matches!(err, EngineError::InvalidProfile(_)));
    }

    #[test]
    fn test_raster_wrap_skips_code_page_pass() {
        let img = RasterImage {
            width: 8,
            height: 1,
            // 0xD9 would be misread as text by a code page pass
            rows: vec![0xD9],
        };
        let bytes = EscposNetworkSink::wrap_raster(PaperSpec::mm80(), &img);
        assert!(bytes.windows(1).any(|w| w == [0xD9]));
        // No ESC t selection in a pure graphics stream
        assert!(!bytes.windows(2).any(|w| w == [0x1B, 0x74]));
    }
}
