//! Log lines for the study tables
//!
//! Every input table is announced when reading starts and summarized with
//! its shape once loaded; outputs are logged with the rows written.

use std::path::Path;
use std::time::Duration;

use arrow::record_batch::RecordBatch;

/// Announce that `table` is about to be read from `path`
pub fn log_table_read(table: &str, path: &Path) {
    log::info!("Reading {table} table from {}", path.display());
}

/// Shape of a loaded table and how long loading took
pub fn log_table_loaded(table: &str, path: &Path, batch: &RecordBatch, elapsed: Duration) {
    log::info!(
        "Loaded {table} table: {} rows x {} columns from {} in {elapsed:?}",
        batch.num_rows(),
        batch.num_columns(),
        path.display()
    );
}

/// Rows of `table` written to `path`
pub fn log_table_written(table: &str, path: &Path, rows: usize, elapsed: Option<Duration>) {
    match elapsed {
        Some(elapsed) => log::info!("Wrote {rows} {table} rows to {} in {elapsed:?}", path.display()),
        None => log::info!("Wrote {rows} {table} rows to {}", path.display()),
    }
}

/// An input with a header but no records; joins against it match nothing
pub fn log_empty_table(table: &str, path: &Path) {
    log::warn!("{table} table {} has no rows", path.display());
}
