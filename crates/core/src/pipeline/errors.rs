use std::path::PathBuf;

use thiserror::Error;

use crate::report::csv_report::ReportError;

/// Failures of a scan invocation, grouped by who can fix them.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("face models are not available")]
    ModelUnavailable,
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("cannot open video {path}: {source}")]
    SourceUnopenable {
        path: PathBuf,
        #[source]
        source: Box<dyn std::error::Error>,
    },
    #[error("failed to decode frame: {0}")]
    Decode(#[source] Box<dyn std::error::Error>),
    #[error("face detection failed: {0}")]
    Detection(#[source] Box<dyn std::error::Error>),
    #[error(transparent)]
    Report(#[from] ReportError),
}

impl ScanError {
    /// Process exit code for the CLI: 2 for caller mistakes, 3 when the
    /// models are missing, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            ScanError::ModelUnavailable => 3,
            ScanError::InvalidInput(_) | ScanError::SourceUnopenable { .. } => 2,
            ScanError::Decode(_) | ScanError::Detection(_) | ScanError::Report(_) => 1,
        }
    }
}
