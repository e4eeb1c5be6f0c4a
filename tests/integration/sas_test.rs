use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Date32Type};
use pupil_axcpt::sas::{ColumnKind, Compression, Endian, SasReadOptions, SasReader};
use pupil_axcpt::utils::test::{Cell, SasFileBuilder, cognitive_fixture};

use crate::utils::{column_names, f64_column, str_column};

fn open(builder: &SasFileBuilder) -> SasReader {
    SasReader::from_bytes(builder.build(), SasReadOptions::default()).expect("valid fixture")
}

#[test]
fn test_fixture_metadata() {
    let reader = open(&cognitive_fixture());
    let meta = reader.metadata();
    assert_eq!(meta.dataset_name, "VETSA2MERGED");
    assert_eq!(meta.file_type, "DATA");
    assert_eq!(meta.row_count, 4);
    assert_eq!(meta.row_length, 45);
    assert!(meta.u64);
    assert_eq!(meta.compression, Compression::None);
    assert_eq!(meta.creator_proc.as_deref(), Some("DATASTEP"));
    assert_eq!(meta.sas_release, "9.0401M0");

    let apoe = &meta.columns[4];
    assert_eq!(apoe.name, "apoe2014");
    assert_eq!(apoe.kind, ColumnKind::Character);
    assert_eq!(apoe.format, "$8.");
    assert_eq!((apoe.offset, apoe.width), (17, 8));
    assert_eq!(meta.columns[0].label, "vetsaid label");
}

#[test]
fn test_rle_rows_decode_like_uncompressed() -> pupil_axcpt::Result<()> {
    let plain = open(&cognitive_fixture());
    let rle = open(&cognitive_fixture().rle());
    assert_eq!(rle.metadata().compression, Compression::Rle);
    assert_eq!(rle.metadata().creator_proc.as_deref(), Some("DATASTEP"));

    let plain = plain.read_batch()?;
    let rle = rle.read_batch()?;
    assert_eq!(plain, rle);

    // 3- and 4-byte numerics come back exact
    assert_eq!(f64_column(&rle, "case"), vec![Some(1.0), Some(1.0), Some(2.0), Some(2.0)]);
    assert_eq!(f64_column(&rle, "HADSHINJ_v2"), vec![Some(9.0), Some(1.0), Some(0.0), Some(1.0)]);
    // blank character cells are null
    assert_eq!(
        str_column(&rle, "apoe2014"),
        vec![Some("3/4".to_string()), Some("3/3".to_string()), None, Some("4/4".to_string())]
    );
    Ok(())
}

#[test]
fn test_layouts_and_page_kinds_decode_to_the_same_rows() -> pupil_axcpt::Result<()> {
    let expected = open(&cognitive_fixture()).read_batch()?;
    let variants = [
        ("rdc", cognitive_fixture().rdc()),
        ("32-bit", cognitive_fixture().layout_32bit()),
        ("big-endian", cognitive_fixture().big_endian()),
        ("32-bit big-endian", cognitive_fixture().layout_32bit().big_endian()),
        ("32-bit big-endian rle", cognitive_fixture().layout_32bit().big_endian().rle()),
        ("64-bit big-endian rdc", cognitive_fixture().big_endian().rdc()),
        ("mix page", cognitive_fixture().mix_page(4)),
        ("mix and data pages", cognitive_fixture().mix_page(2).page_length(1024)),
        ("32-bit mix page", cognitive_fixture().layout_32bit().mix_page(3)),
    ];
    for (name, builder) in variants {
        let batch = open(&builder).read_batch()?;
        assert_eq!(batch, expected, "{name} decodes differently");
    }
    Ok(())
}

#[test]
fn test_layout_metadata_is_reported() {
    let meta = open(&cognitive_fixture().layout_32bit().big_endian()).metadata().clone();
    assert!(!meta.u64);
    assert_eq!(meta.endian, Endian::Big);
    assert_eq!(meta.row_count, 4);
    assert_eq!(meta.sas_release, "9.0401M0");
    assert_eq!(meta.creator_proc.as_deref(), Some("DATASTEP"));
    assert_eq!(meta.columns[5].name, "HADSHINJ_v2");
    assert_eq!(meta.columns[5].width, 4);

    let meta = open(&cognitive_fixture().mix_page(2)).metadata().clone();
    assert_eq!(meta.mix_page_row_count, 2);
    assert_eq!(meta.page_count, 2);

    let meta = open(&cognitive_fixture().rdc()).metadata().clone();
    assert_eq!(meta.compression, Compression::Rdc);
}

#[test]
fn test_rdc_text_rows_decode() -> pupil_axcpt::Result<()> {
    let repeated = "left eye;right eye;left eye;right eye;left eye;right eye";
    let rows = [
        Some(repeated.to_string()),
        None,
        Some("x".repeat(90)),
        Some("abcdefghijklmnopqrstu".repeat(4)),
    ];
    let builder = |compressed: bool| {
        let builder = rows.iter().enumerate().fold(
            SasFileBuilder::new("NOTES").numeric("vetsaid", "").character("note", 120),
            |b, (i, note)| b.row(vec![Cell::from(100.0 + i as f64), Cell::from(note.as_deref())]),
        );
        if compressed { builder.rdc() } else { builder }
    };
    let plain = open(&builder(false)).read_batch()?;
    let rdc = open(&builder(true)).read_batch()?;
    assert_eq!(rdc, plain);
    assert_eq!(str_column(&rdc, "note"), rows.to_vec());
    assert_eq!(f64_column(&rdc, "vetsaid")[3], Some(103.0));
    Ok(())
}

#[test]
fn test_schema_matches_decoded_batch() -> pupil_axcpt::Result<()> {
    let reader = open(&cognitive_fixture());
    let batch = reader.read_batch()?;
    assert_eq!(reader.schema(), batch.schema());
    assert_eq!(reader.schema().field(4).data_type(), &DataType::Utf8);
    Ok(())
}

#[test]
fn test_rows_spread_over_data_pages() -> pupil_axcpt::Result<()> {
    let builder = (0..200i32).fold(
        SasFileBuilder::new("TRIALS")
            .numeric("vetsaid", "")
            .numeric("score", "")
            .page_length(1024),
        |b, i| {
            let score = if i % 7 == 0 { Cell::Missing } else { Cell::from(f64::from(i) / 4.0) };
            b.row(vec![Cell::from(f64::from(1000 + i)), score])
        },
    );
    let reader = open(&builder);
    assert!(reader.metadata().page_count > 2);

    let batch = reader.read_batch()?;
    assert_eq!(batch.num_rows(), 200);
    let ids = f64_column(&batch, "vetsaid");
    assert_eq!(ids[0], Some(1000.0));
    assert_eq!(ids[199], Some(1199.0));
    let scores = f64_column(&batch, "score");
    assert_eq!(scores[7], None);
    assert_eq!(scores[9], Some(2.25));
    Ok(())
}

#[test]
fn test_long_text_rows_compress() -> pupil_axcpt::Result<()> {
    let notes = "attended all sessions";
    let builder = SasFileBuilder::new("NOTES")
        .numeric("vetsaid", "")
        .character("note", 120)
        .row(vec![Cell::from(101.0), Cell::from(notes)])
        .row(vec![Cell::from(102.0), Cell::Missing])
        .row(vec![Cell::from(103.0), Cell::from("x".repeat(90).as_str())])
        .rle();
    let batch = open(&builder).read_batch()?;
    assert_eq!(
        str_column(&batch, "note"),
        vec![Some(notes.to_string()), None, Some("x".repeat(90))]
    );
    Ok(())
}

#[test]
fn test_date_formats_become_date32() -> pupil_axcpt::Result<()> {
    let builder = SasFileBuilder::new("VISITS")
        .numeric("vetsaid", "")
        .numeric("visit", "DATE9.")
        // 2015-04-23 is day 20201 after 1960-01-01
        .row(vec![Cell::from(101.0), Cell::from(20201.0)])
        .row(vec![Cell::from(102.0), Cell::Missing]);
    let reader = open(&builder);
    let batch = reader.read_batch()?;
    assert_eq!(batch.schema().field(1).data_type(), &DataType::Date32);
    let visits = batch.column(1).as_primitive::<Date32Type>();
    assert_eq!(visits.value(0), 20201 - 3653);
    assert!(visits.is_null(1));

    let raw = SasReader::from_bytes(builder.build(), SasReadOptions { convert_dates: false })?
        .read_batch()?;
    assert_eq!(f64_column(&raw, "visit"), vec![Some(20201.0), None]);
    Ok(())
}

#[test]
fn test_read_columns_projects_in_requested_order() -> pupil_axcpt::Result<()> {
    let reader = open(&cognitive_fixture());
    let batch = reader.read_columns(&["APOE2014", "vetsaid"])?;
    assert_eq!(column_names(&batch), vec!["apoe2014", "vetsaid"]);
    assert_eq!(batch.num_rows(), 4);

    let err = reader.read_columns(&["zyg15"]).unwrap_err();
    assert!(matches!(err, pupil_axcpt::MergeError::MissingColumn { .. }));
    Ok(())
}

#[test]
fn test_corrupt_files_are_rejected() {
    let bytes = cognitive_fixture().build();

    let mut bad_magic = bytes.clone();
    bad_magic[14] ^= 0xFF;
    assert!(SasReader::from_bytes(bad_magic, SasReadOptions::default()).is_err());

    // header only: metadata page missing
    let truncated = bytes[..1024].to_vec();
    assert!(SasReader::from_bytes(truncated, SasReadOptions::default()).is_err());
}
