//! Column lookup and replacement helpers for record batches.

use std::sync::Arc;

use arrow::array::ArrayRef;
use arrow::datatypes::{Field, Schema};
use arrow::record_batch::RecordBatch;

use crate::error::{MergeError, Result};

/// Find a column by exact name, falling back to a unique case-insensitive match
///
/// # Arguments
/// * `schema` - The schema to search
/// * `name` - The column name to look up
///
/// # Returns
/// The column index, or `None` if no column (or more than one
/// case-insensitive candidate) matches
#[must_use]
pub fn resolve_column(schema: &Schema, name: &str) -> Option<usize> {
    if let Ok(idx) = schema.index_of(name) {
        return Some(idx);
    }
    let mut candidates = schema
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| f.name().eq_ignore_ascii_case(name))
        .map(|(i, _)| i);
    match (candidates.next(), candidates.next()) {
        (Some(idx), None) => {
            log::debug!(
                "Column '{name}' matched '{}' ignoring case",
                schema.field(idx).name()
            );
            Some(idx)
        }
        _ => None,
    }
}

/// Like [`resolve_column`], but a missing column is an error naming the table
pub fn require_column(batch: &RecordBatch, name: &str, table: &str) -> Result<usize> {
    resolve_column(batch.schema_ref(), name).ok_or_else(|| MergeError::missing_column(table, name))
}

/// Replace column `index` with `array`, keeping the field name
pub fn replace_column(batch: &RecordBatch, index: usize, array: ArrayRef) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    fields[index] = Field::new(
        fields[index].name(),
        array.data_type().clone(),
        fields[index].is_nullable() || array.null_count() > 0,
    );
    let mut columns = batch.columns().to_vec();
    columns[index] = array;
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Replace the column called `name` if present, otherwise append it
pub fn upsert_column(batch: &RecordBatch, name: &str, array: ArrayRef) -> Result<RecordBatch> {
    if let Ok(index) = batch.schema().index_of(name) {
        return replace_column(batch, index, array);
    }
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    fields.push(Field::new(name, array.data_type().clone(), true));
    let mut columns = batch.columns().to_vec();
    columns.push(array);
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}
