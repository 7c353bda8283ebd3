//! Error types for the benchmark harness

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors that can occur while generating, multiplying, timing or writing
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Malformed configuration or generator input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Inner dimensions of the operands disagree
    #[error("Dimension mismatch: left is {left:?}, right is {right:?}")]
    DimensionMismatch {
        /// Shape of the left operand
        left: (usize, usize),
        /// Shape of the right operand
        right: (usize, usize),
    },

    /// Process counters could not be read on this platform
    #[error("Resource sampling unavailable: {0}")]
    ResourceSamplingUnavailable(String),

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Malformed Matrix Market input
    #[error("{}:{line}: {message}", .path.display())]
    MatrixMarket {
        path: PathBuf,
        line: usize,
        message: String,
    },

    /// Appending onto a file whose header differs from the table's header
    #[error("Schema mismatch in {}: expected header `{expected}`, found `{found}`", .path.display())]
    SchemaMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },
}

impl HarnessError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        HarnessError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        HarnessError::Csv {
            path: path.into(),
            source,
        }
    }
}
