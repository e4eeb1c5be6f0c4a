use std::path::Path;

use arrow::array::{Array, AsArray};
use arrow::datatypes::{Float64Type, Int32Type, Int64Type};
use arrow::record_batch::RecordBatch;
use pupil_axcpt::PipelineConfig;
use pupil_axcpt::utils::test::write_study_fixture;
use tempfile::TempDir;

/// Scratch directory holding the study fixture, plus a config pointing at it
pub fn study_dir(rle: bool) -> (TempDir, PipelineConfig) {
    let dir = tempfile::tempdir().expect("create temp dir");
    write_study_fixture(dir.path(), rle).expect("write fixture");
    let config = PipelineConfig::with_data_dir(dir.path());
    (dir, config)
}

/// Column names of a batch, in order
#[must_use]
pub fn column_names(batch: &RecordBatch) -> Vec<String> {
    batch.schema().fields().iter().map(|f| f.name().clone()).collect()
}

/// Values of a float column
#[must_use]
pub fn f64_column(batch: &RecordBatch, name: &str) -> Vec<Option<f64>> {
    let idx = batch.schema().index_of(name).expect("column exists");
    batch.column(idx).as_primitive::<Float64Type>().iter().collect()
}

/// Values of an Int32 column
#[must_use]
pub fn i32_column(batch: &RecordBatch, name: &str) -> Vec<Option<i32>> {
    let idx = batch.schema().index_of(name).expect("column exists");
    batch.column(idx).as_primitive::<Int32Type>().iter().collect()
}

/// Values of an Int64 column, e.g. integers re-read from CSV
#[must_use]
pub fn i64_column(batch: &RecordBatch, name: &str) -> Vec<Option<i64>> {
    let idx = batch.schema().index_of(name).expect("column exists");
    batch.column(idx).as_primitive::<Int64Type>().iter().collect()
}

/// Values of a string column
#[must_use]
pub fn str_column(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
    let idx = batch.schema().index_of(name).expect("column exists");
    let column = batch.column(idx).as_string::<i32>();
    (0..column.len())
        .map(|i| (!column.is_null(i)).then(|| column.value(i).to_string()))
        .collect()
}

/// Lines of a text file
#[must_use]
pub fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .expect("read output")
        .lines()
        .map(ToString::to_string)
        .collect()
}
