//! Error handling for the merge pipeline.

use std::io;
use std::path::{Path, PathBuf};

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

/// Errors raised while loading, recoding, joining or writing tables
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// Error opening, reading or writing a file
    #[error("IO error on {}: {source}", path.display())]
    Io {
        /// File the operation was working on
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Arrow error (CSV parsing, compute kernels, batch construction)
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Parquet export error
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Malformed or unsupported SAS7BDAT content
    #[error("SAS7BDAT error: {0}")]
    Sas(String),

    /// A column the pipeline relies on is absent
    #[error("Column '{column}' not found in {table} table")]
    MissingColumn {
        /// Table being processed
        table: String,
        /// The column that was looked up
        column: String,
    },

    /// A column exists but holds an unusable type
    #[error("Column '{column}' is not a {expected} column")]
    ColumnType {
        /// The offending column
        column: String,
        /// What the operation needed
        expected: String,
    },

    /// Join keys on the right-hand side are not unique (strict mode only)
    #[error("Key '{key}' occurs {count} times in {table} table")]
    DuplicateKeys {
        /// Table holding the duplicates
        table: String,
        /// First repeated key value, in normalized form
        key: String,
        /// Rows carrying that key
        count: usize,
    },

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Config file could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MergeError {
    /// Wrap an IO error with the path it occurred on
    pub fn io(path: impl AsRef<Path>, source: io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Create a SAS format error
    pub fn sas(message: impl Into<String>) -> Self {
        Self::Sas(message.into())
    }

    /// Create a missing column error
    pub fn missing_column(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            table: table.into(),
            column: column.into(),
        }
    }
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, MergeError>;
