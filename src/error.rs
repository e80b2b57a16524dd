//! Error type shared by the loading, normalization, and dataset modules.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building a well-log dataset.
///
/// Every variant is fatal: the pipeline is deterministic and in-memory, so
/// nothing is retried and a failure in one well aborts the whole operation.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Well file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {} at line {line}: {message}", .path.display())]
    Parse {
        path: PathBuf,
        line: u64,
        message: String,
    },

    #[error("Schema mismatch in {} at line {line}: expected {expected} columns, found {found}", .path.display())]
    SchemaMismatch {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("Unknown column: {0}")]
    UnknownColumn(String),

    #[error("Unknown well id {id}: corpus holds wells 1..={well_count}")]
    UnknownWell { id: usize, well_count: usize },

    #[error("Illegal state: {0}")]
    IllegalState(String),

    #[error("Index {index} out of range for dataset of length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cannot fit a scaler on an empty sample")]
    EmptySample,

    #[error("Column count mismatch: scaler was fit on {expected} columns, got {found}")]
    ColumnMismatch { expected: usize, found: usize },
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, DatasetError>;
