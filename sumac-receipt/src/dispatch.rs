//! Print dispatch pipeline
//!
//! One entry point takes a raw front-of-house payload to paper:
//! normalize, resolve a device for the role, pick a rendering method,
//! dedupe, render, submit. Settings, device enumeration and transport
//! are injected as traits so the same pipeline runs against a till,
//! a spool directory, or a test fake.

use crate::capability::CapabilityRegistry;
use crate::classify::has_bidi_content;
use crate::config::{EngineConfig, PaperSpec, ProfileStore, ReceiptTemplate};
use crate::copies::CopyTracker;
use crate::devices::DeviceEnumerator;
use crate::error::{EngineError, EngineResult};
use crate::queue::{JobDeduplicator, JobKey};
use crate::receipt::{PrinterRole, Receipt, ReceiptInput};
use crate::render::raster::RasterFont;
use crate::render::{self, CopyInfo, RenderRequest};
use crate::resolve::{ResolvedPrinter, resolve};
use crate::select::{RenderMethod, select_method};
use crate::sink::{PrintJob, PrintSink};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Shared pipeline state: config plus the stateful pieces that must
/// survive across dispatches
pub struct PrintingContext {
    pub config: EngineConfig,
    pub capabilities: CapabilityRegistry,
    pub copies: CopyTracker,
    pub queue: JobDeduplicator,
}

impl PrintingContext {
    pub fn new(config: EngineConfig) -> Self {
        let copies = CopyTracker::new(config.copy_ttl);
        let queue = JobDeduplicator::new(config.cool_down);
        Self {
            config,
            capabilities: CapabilityRegistry::new(),
            copies,
            queue,
        }
    }
}

impl Default for PrintingContext {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

/// Per-call overrides
#[derive(Debug, Clone, Default)]
pub struct DispatchOptions {
    /// Exact device name to use instead of profile resolution
    pub explicit_device: Option<String>,
    /// Rendering method to use regardless of capability and content
    pub forced_method: Option<RenderMethod>,
}

/// What happened to one dispatched job
#[derive(Debug, Clone)]
pub struct DispatchReport {
    pub job_id: Uuid,
    pub role: PrinterRole,
    pub outcome: DispatchOutcome,
}

#[derive(Debug, Clone)]
pub enum DispatchOutcome {
    Printed {
        device: String,
        method: RenderMethod,
        copy: CopyInfo,
    },
    /// Duplicate job inside the cool-down window, nothing printed
    Skipped,
}

impl DispatchOutcome {
    pub fn printed(&self) -> bool {
        matches!(self, DispatchOutcome::Printed { .. })
    }
}

/// Result of a combined customer + kitchen dispatch
///
/// The two tickets succeed or fail independently; a kitchen outage
/// must not hold the customer's receipt hostage.
#[derive(Debug)]
pub struct BothOutcome {
    pub customer: EngineResult<DispatchReport>,
    pub kitchen: EngineResult<DispatchReport>,
}

impl BothOutcome {
    pub fn fully_printed(&self) -> bool {
        self.printed_count() == 2
    }

    pub fn any_printed(&self) -> bool {
        self.printed_count() > 0
    }

    fn printed_count(&self) -> usize {
        [&self.customer, &self.kitchen]
            .into_iter()
            .filter(|r| matches!(r, Ok(report) if report.outcome.printed()))
            .count()
    }
}

/// The pipeline itself
pub struct PrintDispatcher {
    ctx: PrintingContext,
    store: Arc<dyn ProfileStore>,
    enumerator: Arc<dyn DeviceEnumerator>,
    sink: Arc<dyn PrintSink>,
    font: Option<RasterFont>,
}

impl PrintDispatcher {
    pub fn new(
        ctx: PrintingContext,
        store: Arc<dyn ProfileStore>,
        enumerator: Arc<dyn DeviceEnumerator>,
        sink: Arc<dyn PrintSink>,
    ) -> Self {
        let font = ctx.config.font_path.as_deref().and_then(|path| {
            match RasterFont::from_file(path) {
                Ok(font) => {
                    info!(path = %path.display(), "raster font loaded");
                    Some(font)
                }
                Err(e) => {
                    warn!(error = %e, "raster font unavailable, builtin bitmap font in use");
                    None
                }
            }
        });
        Self {
            ctx,
            store,
            enumerator,
            sink,
            font,
        }
    }

    pub fn context(&self) -> &PrintingContext {
        &self.ctx
    }

    /// Print one ticket for one role
    #[instrument(skip(self, input, opts), fields(role = %role))]
    pub async fn dispatch(
        &self,
        input: ReceiptInput,
        role: PrinterRole,
        opts: &DispatchOptions,
    ) -> EngineResult<DispatchReport> {
        let receipt = input.normalize();
        self.dispatch_normalized(&receipt, role, opts).await
    }

    /// Print the customer receipt and the kitchen ticket for one order
    ///
    /// Both legs run concurrently and report independently.
    #[instrument(skip(self, input, opts), fields(order = tracing::field::Empty))]
    pub async fn dispatch_both(&self, input: ReceiptInput, opts: &DispatchOptions) -> BothOutcome {
        let receipt = input.normalize();
        tracing::Span::current().record("order", receipt.order_number.as_str());

        let (customer, kitchen) = tokio::join!(
            self.dispatch_normalized(&receipt, PrinterRole::Customer, opts),
            self.dispatch_normalized(&receipt, PrinterRole::Kitchen, opts),
        );
        BothOutcome { customer, kitchen }
    }

    /// Render the markup document without touching a device
    ///
    /// No dedup claim, no copy counting; this is the settings-screen
    /// preview flow.
    pub async fn preview(&self, input: ReceiptInput, role: PrinterRole) -> EngineResult<String> {
        let receipt = input.normalize();
        let template = self.store.load_template().await?;
        let has_bidi = has_bidi_content(&receipt, &template);
        let req = RenderRequest {
            receipt: &receipt,
            template: &template,
            role,
            paper: PaperSpec::default(),
            has_bidi,
            copy: CopyInfo::original(),
        };
        Ok(render::markup::render(&req))
    }

    async fn dispatch_normalized(
        &self,
        receipt: &Receipt,
        role: PrinterRole,
        opts: &DispatchOptions,
    ) -> EngineResult<DispatchReport> {
        let job_id = Uuid::new_v4();

        let profiles = self.store.load_profiles().await?;
        let template = self.store.load_template().await?;
        let devices = self.enumerator.enumerate().await?;

        let resolved = resolve(role, opts.explicit_device.as_deref(), &devices, &profiles)?;
        debug!(
            %job_id,
            device = %resolved.device.name,
            strategy = ?resolved.strategy,
            "printer resolved"
        );
        if !resolved.available {
            warn!(device = %resolved.device.name, "resolved printer reported offline");
        }

        let capability = match self.ctx.capabilities.get(&resolved.device.name) {
            Some(c) => c,
            None => self.ctx.capabilities.register(&resolved.device.name),
        };

        let has_bidi = has_bidi_content(receipt, &template);
        let method = select_method(
            &capability,
            has_bidi,
            opts.forced_method,
            self.ctx.config.default_method,
        );
        debug!(%job_id, %method, has_bidi, "render method selected");

        let key = JobKey::new(&receipt.order_number, &resolved.device.name, role);
        if !self.ctx.queue.try_acquire(&key).await {
            return Ok(DispatchReport {
                job_id,
                role,
                outcome: DispatchOutcome::Skipped,
            });
        }

        let result = self
            .print_claimed(receipt, &template, role, &resolved, method, has_bidi, capability.columns)
            .await;
        self.ctx.queue.complete(&key).await;

        result.map(|outcome| DispatchReport {
            job_id,
            role,
            outcome,
        })
    }

    /// Runs with the job key claimed; the caller releases it
    async fn print_claimed(
        &self,
        receipt: &Receipt,
        template: &ReceiptTemplate,
        role: PrinterRole,
        resolved: &ResolvedPrinter,
        method: RenderMethod,
        has_bidi: bool,
        columns: usize,
    ) -> EngineResult<DispatchOutcome> {
        // Count the ticket before rendering. The increment hands each
        // claim a distinct number, so two near-concurrent dispatches
        // for the same order can never both go out unstamped. A failed
        // submit may still have printed partially, so the count stays
        // either way and the next attempt carries a copy stamp.
        let count = self
            .ctx
            .copies
            .mark_printed(&receipt.order_number, role)
            .await;
        let copy = if count > 1 {
            CopyInfo::reprint(count - 1)
        } else {
            CopyInfo::original()
        };

        let paper = PaperSpec::from_columns(columns);
        let req = RenderRequest {
            receipt,
            template,
            role,
            paper,
            has_bidi,
            copy,
        };
        let payload = render::render(method, &req, self.font.as_ref())?;

        let job = PrintJob {
            device: resolved.device.clone(),
            paper,
            payload,
        };
        match tokio::time::timeout(self.ctx.config.submit_timeout, self.sink.submit(&job)).await {
            Ok(Ok(())) => {
                info!(
                    order = %receipt.order_number,
                    device = %job.device.name,
                    %method,
                    copy = copy.is_copy,
                    "ticket printed"
                );
                Ok(DispatchOutcome::Printed {
                    device: job.device.name.clone(),
                    method,
                    copy,
                })
            }
            Ok(Err(e)) => {
                error!(order = %receipt.order_number, device = %job.device.name, error = %e, "print failed");
                Err(e)
            }
            Err(_) => {
                error!(order = %receipt.order_number, device = %job.device.name, "print submission timed out");
                Err(EngineError::SinkTimeout(self.ctx.config.submit_timeout))
            }
        }
    }
}
