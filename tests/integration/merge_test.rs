use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, Int64Array, StringArray};
use arrow::record_batch::RecordBatch;
use pupil_axcpt::PipelineConfig;
use pupil_axcpt::config::ApoeRule;
use pupil_axcpt::loaders::{derive_apoe4, select_columns};
use pupil_axcpt::merge::merge_datasets;
use pupil_axcpt::sas::{SasReadOptions, SasReader};
use pupil_axcpt::utils::test::{Cell, SasFileBuilder};

use crate::utils::{column_names, f64_column, i32_column, i64_column, str_column};

fn table(columns: Vec<(&str, ArrayRef)>) -> RecordBatch {
    RecordBatch::try_from_iter(columns).expect("valid table")
}

fn scratch_config() -> (tempfile::TempDir, PipelineConfig) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let config = PipelineConfig::with_data_dir(dir.path());
    (dir, config)
}

/// One subject present in all three tables
#[test]
fn test_single_subject_example() -> pupil_axcpt::Result<()> {
    let (_dir, config) = scratch_config();
    let pupil = table(vec![
        ("vetsaid", Arc::new(Int64Array::from(vec![101])) as ArrayRef),
        ("trial", Arc::new(Int64Array::from(vec![1]))),
    ]);
    let task = table(vec![
        ("SubjectID", Arc::new(Int64Array::from(vec![101])) as ArrayRef),
        ("RT", Arc::new(Int64Array::from(vec![450]))),
    ]);
    let cognitive = table(vec![
        ("vetsaid", Arc::new(Float64Array::from(vec![101.0])) as ArrayRef),
        ("apoe2014", Arc::new(StringArray::from(vec!["3/4"]))),
    ]);
    let cognitive = derive_apoe4(&cognitive, &ApoeRule::default())?;

    let merged = merge_datasets(&pupil, &task, &cognitive, &config)?.batch;
    assert_eq!(column_names(&merged), vec!["vetsaid", "trial", "RT", "apoe2014", "apoe4"]);
    assert_eq!(i64_column(&merged, "vetsaid"), vec![Some(101)]);
    assert_eq!(i64_column(&merged, "RT"), vec![Some(450)]);
    assert_eq!(str_column(&merged, "apoe2014"), vec![Some("3/4".to_string())]);
    assert_eq!(i32_column(&merged, "apoe4"), vec![Some(1)]);
    assert!(config.paths.merged_out.is_file());
    Ok(())
}

/// Twin identifiers appear once, taken from the pupil table
#[test]
fn test_twin_identifiers_kept_from_left() -> pupil_axcpt::Result<()> {
    let (_dir, config) = scratch_config();
    let ids = |v: Vec<i64>| Arc::new(Int64Array::from(v)) as ArrayRef;
    let pupil = table(vec![
        ("vetsaid", ids(vec![101, 102, 103])),
        ("case", ids(vec![1, 1, 2])),
        ("twin", ids(vec![1, 2, 1])),
        ("zyg14", ids(vec![1, 1, 2])),
    ]);
    let task = table(vec![
        ("SubjectID", ids(vec![103, 101])),
        ("case", ids(vec![0, 0])),
        ("twin", ids(vec![0, 0])),
        ("zyg14", ids(vec![0, 0])),
        ("accuracy", Arc::new(Float64Array::from(vec![0.9, 0.8])) as ArrayRef),
    ]);
    let cognitive = table(vec![
        ("vetsaid", ids(vec![102])),
        ("case", ids(vec![7])),
        ("zyg14", ids(vec![7])),
    ]);

    let output = merge_datasets(&pupil, &task, &cognitive, &config)?;
    let merged = &output.batch;
    let names = column_names(merged);
    for name in ["case", "twin", "zyg14"] {
        assert_eq!(names.iter().filter(|n| *n == name).count(), 1);
    }
    assert!(!names.iter().any(|n| n.ends_with("_x") || n.ends_with("_y") || n == "SubjectID"));
    assert_eq!(i64_column(merged, "case"), vec![Some(1), Some(1), Some(2)]);
    assert_eq!(f64_column(merged, "accuracy"), vec![Some(0.8), None, Some(0.9)]);

    assert_eq!(output.task_join.unmatched_left_rows, 1);
    assert_eq!(output.cognitive_join.unmatched_left_rows, 2);
    assert_eq!(output.cognitive_join.dropped_columns, vec!["case", "zyg14"]);
    Ok(())
}

/// Upper-case SAS names take the variable list's spelling and do not
/// duplicate the pupil table's identifiers
#[test]
fn test_upper_case_sas_names_merge_once() -> pupil_axcpt::Result<()> {
    let (_dir, config) = scratch_config();
    let sas = SasFileBuilder::new("VETSA2MERGED")
        .numeric("VETSAID", "")
        .numeric_with_width("CASE", "", 3)
        .character("apoe2014", 8)
        .row(vec![Cell::from(101.0), Cell::from(2.0), Cell::from("3/4")])
        .row(vec![Cell::from(102.0), Cell::from(2.0), Cell::from("3/3")])
        .build();
    let raw = SasReader::from_bytes(sas, SasReadOptions::default())?.read_batch()?;
    let names = vec!["vetsaid".to_string(), "case".to_string(), "apoe2014".to_string()];
    let cognitive = derive_apoe4(&select_columns(&raw, &names)?, &ApoeRule::default())?;
    assert_eq!(column_names(&cognitive), vec!["vetsaid", "case", "apoe2014", "apoe4"]);

    let pupil = table(vec![
        ("vetsaid", Arc::new(Int64Array::from(vec![101, 102])) as ArrayRef),
        ("case", Arc::new(Int64Array::from(vec![1, 1]))),
    ]);
    let task = table(vec![
        ("SubjectID", Arc::new(Int64Array::from(vec![101])) as ArrayRef),
        ("RT", Arc::new(Int64Array::from(vec![450]))),
    ]);

    let output = merge_datasets(&pupil, &task, &cognitive, &config)?;
    let merged = &output.batch;
    assert_eq!(column_names(merged), vec!["vetsaid", "case", "RT", "apoe2014", "apoe4"]);
    assert_eq!(i64_column(merged, "case"), vec![Some(1), Some(1)]);
    assert_eq!(i32_column(merged, "apoe4"), vec![Some(1), Some(0)]);
    assert_eq!(output.cognitive_join.dropped_columns, vec!["case"]);

    let header = crate::utils::read_lines(&config.paths.merged_out).remove(0);
    assert_eq!(header, "vetsaid,case,RT,apoe2014,apoe4");
    Ok(())
}
