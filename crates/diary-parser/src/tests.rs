use std::fs;
use std::path::PathBuf;

use crate::errors::DiaryFormatError;
use crate::formats::schema::{CURRENT_V13_COLUMNS, LEGACY_V11_COLUMNS};
use crate::model::{DiaryLayout, FIELD_SEPARATOR, UNKNOWN_DIARY_NAME};
use crate::{parse_diary_file, parse_with_layout};

fn fixture_path(path: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(path)
}

fn fixture(path: &str) -> String {
    let full_path = fixture_path(path);
    fs::read_to_string(&full_path)
        .unwrap_or_else(|err| panic!("failed to read fixture {}: {}", full_path.display(), err))
}

fn content_line(width: usize, value: &str) -> String {
    let mut fields: Vec<String> = (0..width).map(|i| format!("f{i}")).collect();
    fields[9] = value.to_string();
    fields.join(&FIELD_SEPARATOR.to_string())
}

fn diary_text(name: &str, lines: &[String], footer_count: usize) -> String {
    let mut text = format!("H,{name}\n");
    for line in lines {
        text.push_str(line);
        text.push('\n');
    }
    text.push_str(&format!("T,{footer_count},20261001"));
    text
}

#[test]
fn parses_valid_batch_fixture() {
    let content = fixture("valid/BATCH1");
    let path = fixture_path("valid/BATCH1");
    let parsed = parse_diary_file(&content, path.to_str().unwrap()).expect("BATCH1 parse failed");

    assert_eq!(parsed.diary_name, "BATCH1");
    assert_eq!(parsed.layout, DiaryLayout::V13);
    assert_eq!(parsed.declared_count, 3);
    assert_eq!(parsed.record_count(), 3);

    let first = &parsed.records[0];
    assert_eq!(first.disposal_diary_id, "DD001");
    assert_eq!(first.tbl_name, "CUSTOMER_ACCT");
    assert_eq!(first.idr_col_name, "ACCT_NO");
    assert_eq!(first.idr_value, "10001");
    assert_eq!(first.idr_start_dt.as_deref(), Some("2019-01-01"));
    assert_eq!(first.idr_end_dt.as_deref(), Some("2019-12-31"));
    assert_eq!(first.juris, "UK");

    assert_eq!(parsed.records[2].tbl_name, "LOAN_BOOK");
    assert_eq!(parsed.records[2].idr_value, "L-77");
    assert!(parsed.verify().is_ok());
}

#[test]
fn footer_count_mismatch_rejects_batch() {
    let content = fixture("bad_footer/BATCH1");
    let err = parse_diary_file(&content, "BATCH1").unwrap_err();
    assert_eq!(
        err,
        DiaryFormatError::RecordCountMismatch {
            declared: 4,
            actual: 3
        }
    );
}

#[test]
fn one_short_line_rejects_whole_batch() {
    let content = fixture("bad_columns/BATCH3");
    let err = parse_diary_file(&content, "BATCH3").unwrap_err();
    assert_eq!(
        err,
        DiaryFormatError::ColumnCount {
            layout: "v13",
            line_number: 3,
            expected: 13,
            found: 12
        }
    );
}

#[test]
fn legacy_fixture_requires_legacy_layout() {
    let content = fixture("legacy/LEGACY1");

    let err = parse_diary_file(&content, "LEGACY1").unwrap_err();
    assert!(matches!(
        err,
        DiaryFormatError::ColumnCount {
            expected: 13,
            found: 11,
            ..
        }
    ));

    let parsed =
        parse_with_layout(&content, "LEGACY1", DiaryLayout::V11).expect("legacy parse failed");
    assert_eq!(parsed.layout, DiaryLayout::V11);
    assert_eq!(parsed.record_count(), 2);
    assert!(parsed.records.iter().all(|r| r.idr_start_dt.is_none()));
    assert_eq!(parsed.records[1].idr_value, "90002");
    assert_eq!(parsed.records[1].juris, "UK");
}

#[test]
fn filename_must_match_header() {
    let content = fixture("valid/BATCH1");
    let err = parse_diary_file(&content, "/incoming/BATCH1.txt").unwrap_err();
    assert_eq!(
        err,
        DiaryFormatError::FilenameMismatch {
            diary_name: "BATCH1".into(),
            file_name: "BATCH1.txt".into(),
        }
    );
}

#[test]
fn header_without_name_uses_unknown() {
    let text = format!("H\n{}\nT,1", content_line(13, "1"));

    let err = parse_diary_file(&text, "BATCH9").unwrap_err();
    assert_eq!(
        err,
        DiaryFormatError::FilenameMismatch {
            diary_name: UNKNOWN_DIARY_NAME.into(),
            file_name: "BATCH9".into(),
        }
    );

    let parsed = parse_diary_file(&text, UNKNOWN_DIARY_NAME).expect("Unknown diary parse");
    assert_eq!(parsed.diary_name, UNKNOWN_DIARY_NAME);
}

#[test]
fn empty_content_is_a_valid_batch() {
    let text = diary_text("EMPTY", &[], 0);
    let parsed = parse_diary_file(&text, "EMPTY").expect("empty diary parse");
    assert_eq!(parsed.record_count(), 0);
    assert!(parsed.verify().is_ok());
}

#[test]
fn single_line_file_is_rejected() {
    let err = parse_diary_file("H,ONLY", "ONLY").unwrap_err();
    assert_eq!(err, DiaryFormatError::TooFewLines { lines: 1 });
}

#[test]
fn wrong_header_type_is_rejected() {
    let text = diary_text("B1", &[content_line(13, "1")], 1).replacen("H,", "X,", 1);
    let err = parse_diary_file(&text, "B1").unwrap_err();
    assert!(matches!(err, DiaryFormatError::InvalidHeader { .. }));
}

#[test]
fn blank_content_line_counts_and_fails_width_check() {
    let lines = vec![content_line(13, "1"), String::new()];
    let text = diary_text("B2", &lines, 2);
    let err = parse_diary_file(&text, "B2").unwrap_err();
    assert!(matches!(
        err,
        DiaryFormatError::ColumnCount {
            line_number: 3,
            found: 1,
            ..
        }
    ));
}

#[test]
fn crlf_files_parse_like_lf_files() {
    let lines = vec![content_line(13, "1"), content_line(13, "2")];
    let text = diary_text("B3", &lines, 2).replace('\n', "\r\n");
    let parsed = parse_diary_file(&text, "B3").expect("CRLF parse");
    assert_eq!(parsed.records[1].idr_value, "2");
    assert_eq!(parsed.records[1].juris, "f12");
}

#[test]
fn verify_detects_tampered_batch() {
    let lines = vec![content_line(13, "1")];
    let mut parsed = parse_diary_file(&diary_text("B4", &lines, 1), "B4").expect("parse");

    parsed.records[0].idr_end_dt = None;
    assert!(matches!(
        parsed.verify().unwrap_err(),
        DiaryFormatError::ColumnCount { line_number: 2, .. }
    ));

    parsed.records.clear();
    assert_eq!(
        parsed.verify().unwrap_err(),
        DiaryFormatError::RecordCountMismatch {
            declared: 1,
            actual: 0
        }
    );
}

#[test]
fn layouts_expose_their_columns() {
    assert_eq!(DiaryLayout::V11.columns(), LEGACY_V11_COLUMNS);
    assert_eq!(DiaryLayout::V13.columns(), CURRENT_V13_COLUMNS);
    assert_eq!(DiaryLayout::CURRENT.width(), 13);
    assert_eq!("v11".parse::<DiaryLayout>(), Ok(DiaryLayout::V11));
    assert!("v12".parse::<DiaryLayout>().is_err());
    assert_eq!(
        serde_json::to_string(&DiaryLayout::V13).unwrap(),
        "\"v13\""
    );
}
