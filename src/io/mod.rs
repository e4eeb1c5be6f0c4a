//! Tabular file input and output.

pub mod csv;
pub mod parquet;

pub use self::csv::{CsvReadOptions, read_csv, write_csv};
pub use self::parquet::write_parquet;

use std::fs::{self, File};
use std::path::Path;

use crate::error::{MergeError, Result};

/// Open an input file, mapping failures to an IO error carrying the path
pub(crate) fn open_input(path: &Path) -> Result<File> {
    File::open(path).map_err(|e| MergeError::io(path, e))
}

/// Create an output file, creating missing parent directories first
pub(crate) fn create_output(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| MergeError::io(parent, e))?;
    }
    File::create(path).map_err(|e| MergeError::io(path, e))
}
