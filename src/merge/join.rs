//! Left join of two record batches on a single key column.
//!
//! Keys are compared on a normalized text form so that an integer key in one
//! table matches the same integral float in the other (`101` and `101.0`).
//! Right-table columns that already exist in the left table are dropped, so
//! the output never carries suffixed duplicates. Names are compared ignoring
//! ASCII case, since SAS column names are case-insensitive.

use std::sync::Arc;

use arrow::array::{Array, ArrayRef, AsArray, UInt32Array};
use arrow::compute::{cast, take};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{MergeError, Result};
use crate::utils::columns::require_column;

/// Table names and key policy for one join
#[derive(Debug, Clone)]
pub struct JoinOptions {
    /// Left table name used in errors
    pub left_table: String,
    /// Right table name used in errors and logs
    pub right_table: String,
    /// Reject right tables that repeat a key instead of multiplying rows
    pub strict_keys: bool,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self {
            left_table: "left".to_string(),
            right_table: "right".to_string(),
            strict_keys: false,
        }
    }
}

/// What a join did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub left_rows: usize,
    pub right_rows: usize,
    pub output_rows: usize,
    /// Left rows without any matching right row
    pub unmatched_left_rows: usize,
    /// Distinct right keys that occur more than once
    pub duplicate_right_keys: usize,
    /// Right columns dropped because the left table already has them
    pub dropped_columns: Vec<String>,
}

/// Normalized join keys of a column; `None` never matches
pub fn normalize_keys(array: &ArrayRef) -> Result<Vec<Option<String>>> {
    let keys = match array.data_type() {
        DataType::Float16 | DataType::Float32 | DataType::Float64 => {
            let values = cast(array, &DataType::Float64)?;
            values
                .as_primitive::<arrow::datatypes::Float64Type>()
                .iter()
                .map(|v| v.and_then(float_key))
                .collect()
        }
        DataType::Null => vec![None; array.len()],
        _ => {
            let values = cast(array, &DataType::Utf8)?;
            values
                .as_string::<i32>()
                .iter()
                .map(|v| v.map(str::trim).filter(|s| !s.is_empty()).map(ToString::to_string))
                .collect()
        }
    };
    Ok(keys)
}

fn float_key(v: f64) -> Option<String> {
    if v.is_nan() {
        None
    } else if v.fract() == 0.0 && v.abs() < 9.0e15 {
        Some(format!("{}", v as i64))
    } else {
        Some(v.to_string())
    }
}

/// Left join `right` onto `left`
///
/// Every left row is kept in order and repeated once per matching right row.
/// The right key column is dropped, as is every right column whose name the
/// left table already uses.
pub fn left_join(
    left: &RecordBatch,
    right: &RecordBatch,
    left_key: &str,
    right_key: &str,
    options: &JoinOptions,
) -> Result<(RecordBatch, JoinStats)> {
    let left_idx = require_column(left, left_key, &options.left_table)?;
    let right_idx = require_column(right, right_key, &options.right_table)?;

    let left_keys = normalize_keys(left.column(left_idx))?;
    let right_keys = normalize_keys(right.column(right_idx))?;

    let mut index: FxHashMap<&str, SmallVec<[u32; 1]>> = FxHashMap::default();
    for (row, key) in right_keys.iter().enumerate() {
        if let Some(key) = key {
            index.entry(key.as_str()).or_default().push(row as u32);
        }
    }

    let duplicate_right_keys = index.values().filter(|rows| rows.len() > 1).count();
    if duplicate_right_keys > 0 {
        // first repeated key in right-table order, for a stable message
        let (key, count) = right_keys
            .iter()
            .flatten()
            .map(|k| (k.as_str(), index[k.as_str()].len()))
            .find(|(_, n)| *n > 1)
            .unwrap_or_default();
        if options.strict_keys {
            return Err(MergeError::DuplicateKeys {
                table: options.right_table.clone(),
                key: key.to_string(),
                count,
            });
        }
        log::warn!(
            "{duplicate_right_keys} keys repeat in the {} table (e.g. '{key}' x{count}); matching rows will be multiplied",
            options.right_table
        );
    }

    let mut left_rows: Vec<u32> = Vec::with_capacity(left.num_rows());
    let mut right_rows: Vec<Option<u32>> = Vec::with_capacity(left.num_rows());
    let mut unmatched_left_rows = 0;
    for (row, key) in left_keys.iter().enumerate() {
        match key.as_deref().and_then(|k| index.get(k)) {
            Some(matches) => {
                for &m in matches {
                    left_rows.push(row as u32);
                    right_rows.push(Some(m));
                }
            }
            None => {
                unmatched_left_rows += 1;
                left_rows.push(row as u32);
                right_rows.push(None);
            }
        }
    }

    let left_take = UInt32Array::from(left_rows);
    let right_take = UInt32Array::from(right_rows);

    let left_schema = left.schema();
    let mut fields: Vec<Field> = left_schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns: Vec<ArrayRef> = left
        .columns()
        .iter()
        .map(|c| take(c.as_ref(), &left_take, None))
        .collect::<std::result::Result<_, _>>()?;

    let mut dropped_columns = Vec::new();
    let right_schema = right.schema();
    for (i, field) in right_schema.fields().iter().enumerate() {
        if i == right_idx {
            continue;
        }
        if left_schema
            .fields()
            .iter()
            .any(|f| f.name().eq_ignore_ascii_case(field.name()))
        {
            dropped_columns.push(field.name().clone());
            continue;
        }
        fields.push(Field::new(field.name(), field.data_type().clone(), true));
        columns.push(take(right.column(i).as_ref(), &right_take, None)?);
    }

    if !dropped_columns.is_empty() {
        log::info!(
            "Keeping {} version of columns also present in {}: {}",
            options.left_table,
            options.right_table,
            dropped_columns.join(", ")
        );
    }

    let batch = RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?;
    let stats = JoinStats {
        left_rows: left.num_rows(),
        right_rows: right.num_rows(),
        output_rows: batch.num_rows(),
        unmatched_left_rows,
        duplicate_right_keys,
        dropped_columns,
    };
    log::debug!("Join {} <- {}: {stats:?}", options.left_table, options.right_table);
    Ok((batch, stats))
}
