//! Rendering method selection
//!
//! Printer firmware text rendering of Arabic is unreliable across
//! vendors, so rich markup is the primary path and raw byte commands are
//! kept only for plain-script content and low-capability devices.

use crate::capability::Capability;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Rendering strategy for one print job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMethod {
    /// Rich markup document (best text shaping)
    Html,
    /// Rasterized image (visual fidelity on any graphics-capable device)
    Canvas,
    /// Raw ESC/POS byte stream (legacy fallback)
    Raw,
}

impl std::fmt::Display for RenderMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RenderMethod::Html => write!(f, "html"),
            RenderMethod::Canvas => write!(f, "canvas"),
            RenderMethod::Raw => write!(f, "raw"),
        }
    }
}

impl std::str::FromStr for RenderMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "html" => Ok(RenderMethod::Html),
            "canvas" => Ok(RenderMethod::Canvas),
            "raw" => Ok(RenderMethod::Raw),
            other => Err(format!("unknown render method '{other}'")),
        }
    }
}

/// Pick a rendering method for a device
///
/// - a forced method is honored unconditionally (diagnostics escape hatch)
/// - bidirectional content walks html -> canvas -> raw by capability;
///   raw cannot shape Arabic reliably and may print replacement glyphs,
///   which is a documented device limitation
/// - plain-script content uses the configured default as-is
pub fn select_method(
    capability: &Capability,
    has_bidi: bool,
    forced: Option<RenderMethod>,
    default_method: RenderMethod,
) -> RenderMethod {
    if let Some(method) = forced {
        return method;
    }

    if has_bidi {
        if capability.supports_markup {
            RenderMethod::Html
        } else if capability.supports_raster {
            RenderMethod::Canvas
        } else {
            warn!("bidi content on a text-only device, falling back to raw bytes");
            RenderMethod::Raw
        }
    } else {
        default_method
    }
}
