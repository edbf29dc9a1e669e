//! Integration tests for the export command

use crate::common::{assertions, sample_data, CliTestRunner};
use std::io::Read;
use tabrecon::ReconError;

fn setup() -> (CliTestRunner, tabrecon::ResultHandle) {
    let runner = CliTestRunner::new().unwrap();
    let source = runner
        .fixture()
        .create_csv("sql.csv", &sample_data::sql_side())
        .unwrap();
    let target = runner
        .fixture()
        .create_csv("file.csv", &sample_data::file_side())
        .unwrap();
    let handle = runner.run_keyed(&source, &target);
    (runner, handle)
}

#[test]
fn test_export_csv() {
    let (runner, handle) = setup();
    let output = runner.fixture().root().join("recon.csv");

    runner.expect_success(&["export", handle.as_str(), "--output", &output.to_string_lossy()]);
    assertions::assert_file_exists_and_not_empty(&output);

    let raw = std::fs::read_to_string(&output).unwrap();
    assert!(raw.starts_with("\"status\",\"pre_post\",\"id\",\"name\",\"price\""));

    let records = assertions::read_plain_export(&output);
    let result = runner.fixture().workspace.load_result(&handle).unwrap();
    assert_eq!(records.len(), result.rows.len());
    for (record, row) in records.iter().zip(&result.rows) {
        assert_eq!(record[0], row.status.as_str());
        assert_eq!(record[1], row.pre_post.as_str());
        let values: Vec<&String> = row.values.values().collect();
        assert_eq!(record[2..].iter().collect::<Vec<_>>(), values);
    }
    assert_eq!(records[2][1], "");
}

#[test]
fn test_export_xlsx() {
    let (runner, handle) = setup();
    let output = runner.fixture().root().join("recon.xlsx");

    runner.expect_success(&["export", "latest", "--output", &output.to_string_lossy()]);
    assertions::assert_file_exists_and_not_empty(&output);

    let file = std::fs::File::open(&output).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    let mut sheet = String::new();
    archive
        .by_name("xl/worksheets/sheet1.xml")
        .unwrap()
        .read_to_string(&mut sheet)
        .unwrap();

    assert!(sheet.contains("<t>Banana</t>"));
    assert!(sheet.contains("<t>Only in SQL</t>"));
    // price cells of the pre/post rows carry the mismatch style
    assert!(sheet.contains(r#"<c r="E2" s="4""#));
    assert!(sheet.contains(r#"<c r="E3" s="4""#));
    assert!(sheet.contains(r#"<c r="D2" s="2""#));
    assert!(sheet.contains(r#"<c r="D3" s="3""#));

    let bytes = std::fs::read(&output).unwrap();
    let again = runner.fixture().root().join("again.xlsx");
    runner.expect_success(&["export", handle.short(), "--output", &again.to_string_lossy()]);
    assert_eq!(bytes, std::fs::read(&again).unwrap());
}

#[test]
fn test_export_explicit_format_overrides_extension() {
    let (runner, handle) = setup();
    let output = runner.fixture().root().join("recon.dat");

    runner.expect_success(&[
        "export",
        handle.as_str(),
        "--output",
        &output.to_string_lossy(),
        "--format",
        "excel",
    ]);
    let bytes = std::fs::read(&output).unwrap();
    assert_eq!(&bytes[..2], b"PK");
}

#[test]
fn test_export_refuses_overwrite_without_force() {
    let (runner, handle) = setup();
    let output = runner.fixture().root().join("recon.csv");
    std::fs::write(&output, "keep me").unwrap();

    let err = runner.expect_failure(&["export", handle.as_str(), "--output", &output.to_string_lossy()]);
    assert!(matches!(err, ReconError::InvalidInput { .. }));
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "keep me");

    runner.expect_success(&[
        "export",
        handle.as_str(),
        "--output",
        &output.to_string_lossy(),
        "--force",
    ]);
    assert!(std::fs::read_to_string(&output).unwrap().starts_with("\"status\""));
}

#[test]
fn test_export_unknown_extension() {
    let (runner, handle) = setup();
    let output = runner.fixture().root().join("recon.pdf");

    let err = runner.expect_failure(&["export", handle.as_str(), "--output", &output.to_string_lossy()]);
    assert!(matches!(err, ReconError::InvalidInput { .. }));
    assert!(!output.exists());
}

#[test]
fn test_export_empty_result() {
    let runner = CliTestRunner::new().unwrap();
    let data = runner
        .fixture()
        .create_csv("same.csv", &crate::common::sample_data::sql_side())
        .unwrap();
    runner.run_keyed(&data, &data);

    let csv_out = runner.fixture().root().join("empty.csv");
    runner.expect_success(&["export", "latest", "--output", &csv_out.to_string_lossy()]);
    assert!(assertions::read_plain_export(&csv_out).is_empty());

    let xlsx_out = runner.fixture().root().join("empty.xlsx");
    runner.expect_success(&["export", "latest", "--output", &xlsx_out.to_string_lossy()]);
    let mut archive = zip::ZipArchive::new(std::fs::File::open(&xlsx_out).unwrap()).unwrap();
    let mut sheet = String::new();
    archive
        .by_name("xl/worksheets/sheet1.xml")
        .unwrap()
        .read_to_string(&mut sheet)
        .unwrap();
    assert!(sheet.contains("No discrepancies found"));
}
