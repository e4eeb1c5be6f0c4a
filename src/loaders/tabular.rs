//! CSV-backed tables: pupillometry trials and AX-CPT task results.

use std::path::Path;
use std::time::Instant;

use arrow::record_batch::RecordBatch;

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::io::{CsvReadOptions, read_csv};
use crate::utils::columns::require_column;
use crate::utils::logging::{log_empty_table, log_table_loaded, log_table_read};

/// Read a CSV table and check that its key column is present
fn load_keyed_table(
    path: &Path,
    key: &str,
    table: &str,
    options: &CsvReadOptions,
) -> Result<RecordBatch> {
    let start = Instant::now();
    log_table_read(table, path);

    let batch = read_csv(path, options)?;
    require_column(&batch, key, table)?;
    if batch.num_rows() == 0 {
        log_empty_table(table, path);
    }

    log_table_loaded(table, path, &batch, start.elapsed());
    Ok(batch)
}

/// Load the long-format pupillometry table (one row per subject and trial)
pub fn load_pupil(config: &PipelineConfig) -> Result<RecordBatch> {
    load_keyed_table(
        &config.paths.pupil_csv,
        &config.keys.pupil_key,
        "pupil",
        &CsvReadOptions::from(&config.csv),
    )
}

/// Load the processed AX-CPT task table
pub fn load_task(config: &PipelineConfig) -> Result<RecordBatch> {
    load_keyed_table(
        &config.paths.task_csv,
        &config.keys.task_key,
        "task",
        &CsvReadOptions::from(&config.csv),
    )
}
