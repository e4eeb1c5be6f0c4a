use crate::utils::{column_names, f64_column, i64_column, read_lines, str_column, study_dir};
use pupil_axcpt::MergeError;
use pupil_axcpt::io::{CsvReadOptions, read_csv};

/// Full run over the fixture study: outputs, row counts and merged values
#[test]
fn test_end_to_end_merge() -> pupil_axcpt::Result<()> {
    let (_dir, config) = study_dir(false);
    let summary = pupil_axcpt::run(&config)?;

    assert_eq!(summary.cognitive_rows, 4);
    assert_eq!(summary.pupil_rows, 4);
    assert_eq!(summary.task_rows, 3);
    assert_eq!(summary.merged_rows, summary.pupil_rows);
    assert_eq!(summary.task_join.dropped_columns, vec!["case", "twin", "zyg14"]);
    assert_eq!(summary.cognitive_join.dropped_columns, vec!["case", "twin", "zyg14"]);
    assert_eq!(summary.outputs, vec![config.paths.cognitive_out.clone(), config.paths.merged_out.clone()]);
    assert_eq!((summary.task_join.left_rows, summary.task_join.right_rows), (4, 3));
    assert_eq!((summary.cognitive_join.left_rows, summary.cognitive_join.right_rows), (4, 4));
    assert_eq!(summary.cognitive_join.unmatched_left_rows, 1);
    summary.log();

    let merged = read_csv(&config.paths.merged_out, &CsvReadOptions::default())?;
    assert_eq!(
        column_names(&merged),
        vec![
            "vetsaid", "trial", "case", "twin", "zyg14", "pupil_dilation", "RT", "accuracy",
            "apoe2014", "HADSHINJ_v2", "NUMHINJ_v2", "apoe4",
        ]
    );
    assert_eq!(i64_column(&merged, "vetsaid"), vec![Some(101), Some(101), Some(102), Some(105)]);
    assert_eq!(i64_column(&merged, "RT"), vec![Some(450), Some(450), Some(512), None]);
    assert_eq!(i64_column(&merged, "case"), vec![Some(1), Some(1), Some(1), Some(3)]);
    assert_eq!(
        str_column(&merged, "apoe2014"),
        vec![Some("3/4".to_string()), Some("3/4".to_string()), Some("3/3".to_string()), None]
    );
    assert_eq!(i64_column(&merged, "apoe4"), vec![Some(1), Some(1), Some(0), None]);
    assert_eq!(f64_column(&merged, "NUMHINJ_v2"), vec![None, None, Some(2.0), None]);
    Ok(())
}

#[test]
fn test_cognitive_intermediate_is_selected_and_recoded() -> pupil_axcpt::Result<()> {
    let (_dir, config) = study_dir(false);
    pupil_axcpt::run(&config)?;

    let cognitive = read_csv(&config.paths.cognitive_out, &CsvReadOptions::default())?;
    let names = column_names(&cognitive);
    assert!(!names.contains(&"PSYCHWB_v2".to_string()));
    assert_eq!(names.last().map(String::as_str), Some("apoe4"));

    assert_eq!(i64_column(&cognitive, "apoe4"), vec![Some(1), Some(0), None, Some(1)]);
    assert_eq!(f64_column(&cognitive, "HADSHINJ_v2"), vec![None, Some(1.0), Some(0.0), Some(1.0)]);
    assert_eq!(f64_column(&cognitive, "NUMHINJ_v2"), vec![None, Some(2.0), None, Some(1.0)]);
    Ok(())
}

#[test]
fn test_compressed_cognitive_file_gives_identical_output() -> pupil_axcpt::Result<()> {
    let (_plain_dir, plain) = study_dir(false);
    let (_rle_dir, rle) = study_dir(true);
    pupil_axcpt::run(&plain)?;
    pupil_axcpt::run(&rle)?;

    assert_eq!(read_lines(&plain.paths.merged_out), read_lines(&rle.paths.merged_out));
    assert_eq!(read_lines(&plain.paths.cognitive_out), read_lines(&rle.paths.cognitive_out));
    Ok(())
}

#[test]
fn test_parquet_export_and_output_dir() -> pupil_axcpt::Result<()> {
    use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

    let (dir, mut config) = study_dir(false);
    config.paths.merged_parquet = Some("merged.parquet".into());
    config.set_output_dir(dir.path().join("out"));
    let summary = pupil_axcpt::run(&config)?;

    let parquet_path = dir.path().join("out").join("merged.parquet");
    assert_eq!(summary.outputs.last(), Some(&parquet_path));
    assert!(dir.path().join("out").join("pupil_AX-CPT.csv").is_file());

    let file = std::fs::File::open(&parquet_path).expect("parquet written");
    let rows: usize = ParquetRecordBatchReaderBuilder::try_new(file)?
        .build()?
        .map(|b| b.map(|b| b.num_rows()))
        .sum::<std::result::Result<usize, _>>()?;
    assert_eq!(rows, 4);
    Ok(())
}

#[test]
fn test_duplicate_task_rows_multiply_unless_strict() -> pupil_axcpt::Result<()> {
    let (_dir, mut config) = study_dir(false);
    let mut task = std::fs::read_to_string(&config.paths.task_csv).expect("fixture");
    task.push_str("101,1,1,1,461,0.97\n");
    std::fs::write(&config.paths.task_csv, task).expect("fixture");

    let summary = pupil_axcpt::run(&config)?;
    assert_eq!(summary.merged_rows, 6);
    assert_eq!(summary.task_join.duplicate_right_keys, 1);

    config.strict_keys = true;
    let err = pupil_axcpt::run(&config).unwrap_err();
    assert!(matches!(err, MergeError::DuplicateKeys { ref table, count: 2, .. } if table == "task"));
    Ok(())
}

#[test]
fn test_missing_input_fails_before_any_output() {
    let (_dir, config) = study_dir(false);
    std::fs::remove_file(&config.paths.pupil_csv).expect("fixture");

    let err = pupil_axcpt::run(&config).unwrap_err();
    assert!(matches!(err, MergeError::Config(_)));
    assert!(!config.paths.cognitive_out.exists());
}

#[test]
fn test_unknown_cognitive_variable_is_fatal() {
    let (_dir, config) = study_dir(false);
    std::fs::write(&config.paths.cognitive_variables, "NAME\nvetsaid\nMEMORY_v2\n").expect("fixture");

    let err = pupil_axcpt::run(&config).unwrap_err();
    assert!(matches!(
        err,
        MergeError::MissingColumn { ref table, ref column } if table == "cognitive" && column == "MEMORY_v2"
    ));
}
