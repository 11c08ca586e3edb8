//! Engine error taxonomy
//!
//! Failures split into two families the UI treats differently:
//! configuration errors (nothing to print to - fix settings, never
//! retried) and transport errors (the device rejected or timed out -
//! retry is the caller's call).

use crate::receipt::PrinterRole;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// No enumerated device resolves for the requested role
    #[error("no printer configured or available for role '{role}'")]
    PrinterNotFound { role: PrinterRole },

    /// A stored profile is unusable (bad address, empty name, ...)
    #[error("invalid printer profile: {0}")]
    InvalidProfile(String),

    /// Payload production failed
    #[error("render failed: {0}")]
    Render(String),

    /// The sink cannot consume this payload kind
    #[error("unsupported payload for sink: {0}")]
    Unsupported(String),

    /// The print sink rejected the job
    #[error("print sink error: {0}")]
    Sink(#[from] sumac_printer::PrintError),

    /// The print sink did not answer within the deadline
    #[error("print sink timed out after {0:?}")]
    SinkTimeout(Duration),

    /// Configuration store I/O failure
    #[error("configuration store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration store content is not valid JSON
    #[error("malformed configuration: {0}")]
    Format(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Settings problem - surfaced immediately, never retried automatically
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            EngineError::PrinterNotFound { .. }
                | EngineError::InvalidProfile(_)
                | EngineError::Unsupported(_)
                | EngineError::Format(_)
        )
    }

    /// Device/transport problem - retry is the caller's responsibility
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            EngineError::Sink(_) | EngineError::SinkTimeout(_) | EngineError::Io(_)
        )
    }
}
