//! Receipt rendering
//!
//! Three strategies share one canonical input and diverge entirely in
//! output type, so the result is a tagged union the dispatcher's submit
//! step can switch on exhaustively:
//!
//! - [`markup`]: rich HTML document, browser-grade text shaping
//! - [`raster`]: 1-bit bitmap with our own Arabic shaping
//! - [`raw`]: ESC/POS byte stream for legacy devices

pub mod markup;
pub mod raster;
pub mod raw;

use crate::config::{PaperSpec, ReceiptTemplate};
use crate::error::EngineResult;
use crate::receipt::{PrinterRole, Receipt};
use crate::select::RenderMethod;

/// Everything a renderer needs for one payload
pub struct RenderRequest<'a> {
    pub receipt: &'a Receipt,
    pub template: &'a ReceiptTemplate,
    pub role: PrinterRole,
    pub paper: PaperSpec,
    pub has_bidi: bool,
    pub copy: CopyInfo,
}

/// Reprint state passed down from the copy tracker
#[derive(Debug, Clone, Copy, Default)]
pub struct CopyInfo {
    pub is_copy: bool,
    /// How many times this identity printed before (1 = first reprint)
    pub number: u32,
}

impl CopyInfo {
    pub fn original() -> Self {
        Self::default()
    }

    pub fn reprint(number: u32) -> Self {
        Self {
            is_copy: true,
            number: number.max(1),
        }
    }
}

/// Rendering output, tagged by kind
#[derive(Debug, Clone)]
pub enum RenderedPayload {
    /// Rich markup document
    Markup(String),
    /// Packed 1-bit raster image
    Image(RasterImage),
    /// Ready-to-send ESC/POS byte stream
    RawBytes(Vec<u8>),
}

impl RenderedPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            RenderedPayload::Markup(_) => "markup",
            RenderedPayload::Image(_) => "image",
            RenderedPayload::RawBytes(_) => "raw",
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RenderedPayload::Markup(s) => s.len(),
            RenderedPayload::Image(img) => img.rows.len(),
            RenderedPayload::RawBytes(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 1-bit monochrome image, rows packed MSB-first
#[derive(Debug, Clone)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// `width.div_ceil(8)` bytes per row, bit 1 = black
    pub rows: Vec<u8>,
}

impl RasterImage {
    pub fn bytes_per_row(&self) -> usize {
        self.width.div_ceil(8) as usize
    }
}

/// Render one payload with the requested method
///
/// `font` feeds the raster path only; `None` falls back to the builtin
/// bitmap font.
pub fn render(
    method: RenderMethod,
    req: &RenderRequest<'_>,
    font: Option<&raster::RasterFont>,
) -> EngineResult<RenderedPayload> {
    match method {
        RenderMethod::Html => Ok(RenderedPayload::Markup(markup::render(req))),
        RenderMethod::Canvas => raster::render(req, font).map(RenderedPayload::Image),
        RenderMethod::Raw => Ok(RenderedPayload::RawBytes(raw::render(req))),
    }
}

/// The "COPY" stamp line, localized to the content script
pub(crate) fn copy_marker(copy: CopyInfo, arabic: bool) -> Option<String> {
    if !copy.is_copy {
        return None;
    }
    let n = copy.number.max(1);
    Some(if arabic {
        format!("*** نسخة #{} ***", crate::format::to_arabic_digits(&n.to_string()))
    } else {
        format!("*** COPY #{n} ***")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_copy_marker() {
        assert!(copy_marker(CopyInfo::original(), false).is_none());
        assert_eq!(
            copy_marker(CopyInfo::reprint(1), false).as_deref(),
            Some("*** COPY #1 ***")
        );
        assert_eq!(
            copy_marker(CopyInfo::reprint(2), true).as_deref(),
            Some("*** نسخة #٢ ***")
        );
    }

    #[test]
    fn test_payload_kind_tags() {
        assert_eq!(RenderedPayload::Markup(String::new()).kind(), "markup");
        assert_eq!(RenderedPayload::RawBytes(vec![]).kind(), "raw");
        let img = RasterImage {
            width: 8,
            height: 1,
            rows: vec![0xFF],
        };
        assert_eq!(RenderedPayload::Image(img).kind(), "image");
    }
}
