//! CSV reading with schema inference, and CSV writing.

use std::io::{BufWriter, Seek, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow::csv::reader::Format;
use arrow::csv::{ReaderBuilder, WriterBuilder};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use itertools::Itertools;
use regex::Regex;

use crate::config::{CsvConfig, DEFAULT_BATCH_SIZE};
use crate::error::{MergeError, Result};
use crate::io::{create_output, open_input};

/// Options for reading a CSV file into a record batch
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    /// Rows decoded per Arrow batch before concatenation
    pub batch_size: usize,
    /// Records scanned to infer column types; `None` scans every record
    pub infer_rows: Option<usize>,
    /// Field values treated as null
    pub null_values: Vec<String>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self::from(&CsvConfig::default())
    }
}

impl From<&CsvConfig> for CsvReadOptions {
    fn from(config: &CsvConfig) -> Self {
        Self {
            batch_size: if config.batch_size == 0 {
                DEFAULT_BATCH_SIZE
            } else {
                config.batch_size
            },
            infer_rows: config.infer_rows.filter(|&n| n > 0),
            null_values: config.null_values.clone(),
        }
    }
}

impl CsvReadOptions {
    /// Anchored alternation of the null tokens, e.g. `^(|NA|NaN)$`
    pub fn null_regex(&self) -> Result<Regex> {
        let alternatives = self.null_values.iter().map(|v| regex::escape(v)).join("|");
        Regex::new(&format!("^(?:{alternatives})$"))
            .map_err(|e| MergeError::Config(format!("invalid null value list: {e}")))
    }
}

/// Read a CSV file with a header row into a single record batch
pub fn read_csv(path: impl AsRef<Path>, options: &CsvReadOptions) -> Result<RecordBatch> {
    let path = path.as_ref();
    let mut file = open_input(path)?;

    let format = Format::default()
        .with_header(true)
        .with_null_regex(options.null_regex()?);
    let (schema, records) = format.infer_schema(&mut file, options.infer_rows)?;
    log::debug!(
        "Inferred {} columns from {records} records of {}",
        schema.fields().len(),
        path.display()
    );
    file.rewind().map_err(|e| MergeError::io(path, e))?;

    let schema = Arc::new(schema);
    let reader = ReaderBuilder::new(Arc::clone(&schema))
        .with_format(format)
        .with_batch_size(options.batch_size)
        .build(file)?;
    let batches = reader.collect::<std::result::Result<Vec<_>, ArrowError>>()?;

    Ok(concat_batches(&schema, &batches)?)
}

/// Write a record batch as CSV with a header row; nulls become empty fields
pub fn write_csv(batch: &RecordBatch, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let file = BufWriter::new(create_output(path)?);
    let mut writer = WriterBuilder::new().with_header(true).build(file);
    writer.write(batch)?;
    writer
        .into_inner()
        .flush()
        .map_err(|e| MergeError::io(path, e))
}
