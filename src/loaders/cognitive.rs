//! Cognitive dataset: SAS input, variable selection, APOE carrier flag and
//! missing-code recoding.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use arrow::array::{Array, AsArray, Float64Array, Int32Array};
use arrow::compute::kernels::cmp::eq;
use arrow::compute::{cast, nullif};
use arrow::datatypes::{DataType, Schema};
use arrow::record_batch::RecordBatch;
use itertools::Itertools;

use crate::config::{ApoeRule, PipelineConfig, SentinelRule};
use crate::error::{MergeError, Result};
use crate::io::{CsvReadOptions, read_csv, write_csv};
use crate::sas::{SasReadOptions, SasReader};
use crate::utils::columns::{replace_column, require_column, upsert_column};
use crate::utils::logging::{log_table_loaded, log_table_read, log_table_written};

/// Table name used in error messages
pub const TABLE: &str = "cognitive";

/// Column of the variable list holding the variable names
pub const NAME_COLUMN: &str = "NAME";

/// Read the variable names to keep from the `NAME` column of a CSV file
///
/// Blank and null entries are skipped; repeated names keep their first position.
pub fn load_variable_list(path: impl AsRef<Path>, options: &CsvReadOptions) -> Result<Vec<String>> {
    let path = path.as_ref();
    let batch = read_csv(path, options)?;
    let idx = require_column(&batch, NAME_COLUMN, "variable list")?;
    let names = cast(batch.column(idx), &DataType::Utf8)?;

    let names: Vec<String> = names
        .as_string::<i32>()
        .iter()
        .flatten()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unique()
        .map(ToString::to_string)
        .collect();

    log::debug!("{} cognitive variables listed in {}", names.len(), path.display());
    Ok(names)
}

/// Restrict `batch` to `names`, in the order listed
///
/// Columns are matched ignoring case and renamed to the listed spelling, so
/// `CASE` in the SAS file comes out as `case` when the list says `case`.
pub fn select_columns(batch: &RecordBatch, names: &[String]) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields = Vec::with_capacity(names.len());
    let mut columns = Vec::with_capacity(names.len());
    for name in names {
        let idx = require_column(batch, name, TABLE)?;
        let field = schema.field(idx);
        if field.name() != name {
            log::debug!("Renaming SAS column {} to {name}", field.name());
        }
        fields.push(field.clone().with_name(name));
        columns.push(batch.column(idx).clone());
    }
    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

/// Add the carrier flag: 1 when the genotype contains the allele, 0 when it
/// does not, null when the genotype is missing
pub fn derive_apoe4(batch: &RecordBatch, rule: &ApoeRule) -> Result<RecordBatch> {
    let idx = require_column(batch, &rule.genotype_column, TABLE)?;
    let genotype = cast(batch.column(idx), &DataType::Utf8)?;

    let flag: Int32Array = genotype
        .as_string::<i32>()
        .iter()
        .map(|g| g.map(|g| i32::from(g.contains(rule.allele.as_str()))))
        .collect();

    log::debug!(
        "Derived {} from {}: {} carriers, {} missing",
        rule.output_column,
        rule.genotype_column,
        flag.iter().flatten().filter(|&v| v == 1).count(),
        flag.null_count()
    );
    upsert_column(batch, &rule.output_column, Arc::new(flag))
}

/// Replace each rule's sentinel value with null in its column
pub fn recode_sentinels(batch: &RecordBatch, rules: &[SentinelRule]) -> Result<RecordBatch> {
    let mut batch = batch.clone();
    for rule in rules {
        let idx = require_column(&batch, &rule.column, TABLE)?;
        let column = batch.column(idx);
        if !column.data_type().is_numeric() {
            return Err(MergeError::ColumnType {
                column: rule.column.clone(),
                expected: "numeric".to_string(),
            });
        }

        let values = cast(column, &DataType::Float64)?;
        let mask = eq(&values, &Float64Array::new_scalar(rule.value))?;
        let hits = mask.true_count();
        if hits == 0 {
            continue;
        }

        let recoded = nullif(column.as_ref(), &mask)?;
        log::debug!("Recoded {hits} '{}' values of {} to null", rule.value, rule.column);
        batch = replace_column(&batch, idx, recoded)?;
    }
    Ok(batch)
}

/// Load the cognitive table and write the intermediate CSV
pub fn load_cognitive(config: &PipelineConfig) -> Result<RecordBatch> {
    let start = Instant::now();
    let paths = &config.paths;
    let csv_options = CsvReadOptions::from(&config.csv);

    let names = load_variable_list(&paths.cognitive_variables, &csv_options)?;

    log_table_read(TABLE, &paths.cognitive_sas);
    let reader = SasReader::open(
        &paths.cognitive_sas,
        SasReadOptions {
            convert_dates: config.sas.convert_dates,
        },
    )?;
    let raw = reader.read_batch()?;

    let batch = select_columns(&raw, &names)?;
    let batch = derive_apoe4(&batch, &config.apoe)?;
    let batch = recode_sentinels(&batch, &config.sentinels)?;

    log_table_loaded(TABLE, &paths.cognitive_sas, &batch, start.elapsed());

    write_csv(&batch, &paths.cognitive_out)?;
    log_table_written(TABLE, &paths.cognitive_out, batch.num_rows(), None);
    Ok(batch)
}
