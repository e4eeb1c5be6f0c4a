//! Console output utilities
//!
//! This module provides the formatted output of the `--describe` mode.

use arrow::datatypes::Schema;
use arrow::record_batch::RecordBatch;

use crate::sas::SasMetadata;
use crate::sas::header::format_timestamp;

/// Print row/column counts and the schema of a table
pub fn print_table_summary(name: &str, batch: &RecordBatch) {
    print_schema(name, batch.num_rows(), &batch.schema());
}

/// Print a row count and the Arrow fields a table has or will have
pub fn print_schema(name: &str, rows: usize, schema: &Schema) {
    println!("{name}: {rows} rows x {} columns", schema.fields().len());
    for field in schema.fields() {
        println!("  - {} ({})", field.name(), field.data_type());
    }
}

/// Print the header and column dictionary of a SAS dataset
pub fn print_sas_metadata(meta: &SasMetadata) {
    println!("Dataset:     {} ({})", meta.dataset_name, meta.file_type);
    println!("Created:     {}", format_timestamp(meta.created));
    println!("Modified:    {}", format_timestamp(meta.modified));
    println!("Release:     {} ({})", meta.sas_release, meta.platform);
    println!(
        "Layout:      {}-bit, {:?} endian, encoding byte {}",
        if meta.u64 { 64 } else { 32 },
        meta.endian,
        meta.encoding
    );
    println!("Compression: {:?}", meta.compression);
    if let Some(creator) = &meta.creator_proc {
        println!("Creator:     {creator}");
    }
    println!(
        "Rows:        {} ({} bytes each, {} pages of {} bytes)",
        meta.row_count, meta.row_length, meta.page_count, meta.page_length
    );
    println!("Columns:");
    for column in &meta.columns {
        println!(
            "  - {:<16} {:?}({}) format={} label={}",
            column.name, column.kind, column.width, column.format, column.label
        );
    }
}
