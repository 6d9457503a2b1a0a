// 🚨 Error Taxonomy - What can go wrong during a reconciliation run
//
// File-level problems (unreadable, unrecognized) are recovered by the
// aggregator: the file is skipped and a warning is logged.
// Data-shape problems inside a recognized file are fatal for the run.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the reconciliation library
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Path is not a regular file, or cannot be read as CSV
    #[error("Unreadable file {}: {reason}", path.display())]
    UnreadableFile { path: PathBuf, reason: String },

    /// File name matches no registered statement prefix
    #[error("Unrecognized statement format: {file}")]
    UnrecognizedFormat { file: String },

    /// A recognized file has a missing column or a bad date/amount
    #[error("Cannot normalize {file} line {line}, field '{field}': {message}")]
    Normalization {
        file: String,
        line: usize,
        field: String,
        message: String,
    },

    /// Engine invoked with inputs that break its contract
    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl ReconcileError {
    /// Whether the aggregator may skip the file and keep going
    pub fn is_skippable(&self) -> bool {
        matches!(
            self,
            ReconcileError::UnreadableFile { .. } | ReconcileError::UnrecognizedFormat { .. }
        )
    }
}

pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;
