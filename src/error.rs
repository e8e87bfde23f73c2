//! Verifier errors
//!
//! Probe failures never surface here; they become failed `ProbeOutcome`s.
//! These are the few things that can go wrong around the probes.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    /// Configuration rejected before any probe ran
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Report file could not be written
    #[error("Failed to write report {}: {source}", .path.display())]
    ReportWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Report could not be rendered as JSON
    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VerifyError>;
