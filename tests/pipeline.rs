mod common;

use std::process::Command;

use coord_table::{convert_file_to_results_csv, ConvertError, Session};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

#[test]
fn loads_maps_and_exports_the_documented_scenario() {
    let dir = tempdir().expect("tempdir should be created");
    let input = common::write_fixture(dir.path(), "points.csv", "Точка,X,Y\nA,10,20\nB,30,40\n");

    let mut session = Session::new();
    let table = session.load_file(&input).expect("load should succeed");

    assert_eq!(table.len(), 2);
    assert_eq!(table.records()[0].label, "A");
    assert_eq!(table.records()[0].x, "10");
    assert_eq!(table.records()[1].y, "40");

    let csv = table.to_csv().expect("table is not empty");
    assert_eq!(csv, "ID,Точка,X,Y\n1,\"A\",10,20\n2,\"B\",30,40\n");
}

#[test]
fn serialization_is_stable_under_reparsing() {
    let mut session = Session::new();
    session
        .load_text("Точка,X,Y\n\"A \"\"prime\"\"\",10,20\nB,30,40\n")
        .expect("load should succeed");
    let first = session
        .table()
        .expect("table present")
        .to_csv()
        .expect("table is not empty");

    // Feed the export back through the parser and mapper.
    let mut second_session = Session::new();
    second_session
        .load_text(&first)
        .expect("re-parse should succeed");
    let second = second_session
        .table()
        .expect("table present")
        .to_csv()
        .expect("table is not empty");

    assert_eq!(first, second);
    assert_eq!(
        second_session.table().expect("table present").records()[0].label,
        "A \"prime\""
    );
}

#[test]
fn semicolon_separated_input_is_detected() {
    let mut session = Session::new();
    let table = session
        .load_text("Точка;X;Y\nA;10;20\n")
        .expect("load should succeed");
    assert_eq!(table.records()[0].x, "10");
}

#[test]
fn batch_conversion_reports_validation_and_transform_tallies() {
    let dir = tempdir().expect("tempdir should be created");
    let mut content = String::from("Точка,X,Y\n");
    for n in 1..=8 {
        content.push_str(&format!("P{n},3{n}.0,55.0\n"));
    }
    content.push_str("bad1,,55.0\nbad2,abc,55.0\n");
    let input = common::write_fixture(dir.path(), "mixed.csv", &content);

    let (csv, report) =
        convert_file_to_results_csv(&input, "WGS 84", "СК-42").expect("conversion should succeed");

    assert_eq!(report.row_count, 10);
    assert_eq!(report.transformed_count, 8);
    assert_eq!(report.validation_error_count, 2);
    assert_eq!(report.success_count, 8);
    assert!((report.success_rate_percent - 100.0).abs() < f64::EPSILON);
    assert!(csv.contains("\"SourceSystem\""));
    assert!(csv.contains(";\"success\""));
}

#[test]
fn oversized_file_is_rejected_with_the_limit_in_the_message() {
    let dir = tempdir().expect("tempdir should be created");
    let input = dir.path().join("big.csv");
    std::fs::write(&input, vec![b'x'; 6 * 1024 * 1024]).expect("fixture should be written");

    let err = convert_file_to_results_csv(&input, "WGS 84", "СК-42").expect_err("must be rejected");
    assert!(matches!(err, ConvertError::FileTooLarge { .. }));
    assert!(err.to_string().contains("5242880"));
}

#[test]
fn cli_convert_writes_result_csv() {
    let dir = tempdir().expect("tempdir should be created");
    let input = common::write_fixture(dir.path(), "points.csv", common::sample_points_csv());
    let output = dir.path().join("out.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_csv2crs"))
        .args([
            "convert",
            "-i",
            &input.to_string_lossy(),
            "-s",
            "WGS 84",
            "-t",
            "UTM 36N",
            "-o",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");
    assert!(status.success());

    let csv = std::fs::read_to_string(&output).expect("output should be readable");
    assert!(csv.contains("\"WGS 84\""), "unexpected output: {csv}");
    assert!(csv.contains("\"UTM 36N\""), "unexpected output: {csv}");
    assert!(csv.contains("\"success\""), "unexpected output: {csv}");
}

#[test]
fn cli_convert_exits_with_code_2_when_nothing_succeeds() {
    let dir = tempdir().expect("tempdir should be created");
    let input = common::write_fixture(dir.path(), "empty.csv", "Точка,X,Y\nA,,\nB,oops,nope\n");
    let output = dir.path().join("out.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_csv2crs"))
        .args([
            "convert",
            "-i",
            &input.to_string_lossy(),
            "-s",
            "WGS 84",
            "-t",
            "UTM 36N",
            "-o",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");
    assert_eq!(status.code(), Some(2));
}

#[test]
fn cli_convert_swaps_axes_on_request() {
    let dir = tempdir().expect("tempdir should be created");
    // Coordinates arrive as lat,lon; --swap-xy restores lon,lat order.
    let input = common::write_fixture(dir.path(), "swapped.csv", "Точка,X,Y\nA,55.755,37.617\n");
    let output = dir.path().join("out.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_csv2crs"))
        .args([
            "convert",
            "-i",
            &input.to_string_lossy(),
            "-s",
            "WGS 84",
            "-t",
            "Web Mercator",
            "-o",
            &output.to_string_lossy(),
            "--swap-xy",
        ])
        .status()
        .expect("CLI should run");
    assert!(status.success());

    let csv = std::fs::read_to_string(&output).expect("output should be readable");
    assert!(csv.contains("\"37.617\""), "unexpected output: {csv}");
    assert!(csv.contains("\"success\""), "unexpected output: {csv}");
}

#[test]
fn cli_convert_accepts_mapping_overrides() {
    let dir = tempdir().expect("tempdir should be created");
    let input = common::write_fixture(
        dir.path(),
        "custom.csv",
        "alpha,beta,gamma\nA,37.617,55.755\n",
    );
    let output = dir.path().join("out.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_csv2crs"))
        .args([
            "convert",
            "-i",
            &input.to_string_lossy(),
            "-s",
            "WGS 84",
            "-t",
            "UTM 36N",
            "-o",
            &output.to_string_lossy(),
            "--point-column",
            "alpha",
            "--x-column",
            "beta",
            "--y-column",
            "gamma",
        ])
        .status()
        .expect("CLI should run");
    assert!(status.success());
}

#[test]
fn cli_convert_uses_imported_systems() {
    let dir = tempdir().expect("tempdir should be created");
    let input = common::write_fixture(dir.path(), "points.csv", common::sample_points_csv());
    let systems = common::write_fixture(dir.path(), "systems.json", common::sample_srs_json());
    let output = dir.path().join("out.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_csv2crs"))
        .args([
            "convert",
            "-i",
            &input.to_string_lossy(),
            "-s",
            "WGS 84",
            "-t",
            "EPSG:28407",
            "-o",
            &output.to_string_lossy(),
            "--systems-file",
            &systems.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");
    assert!(status.success());

    let csv = std::fs::read_to_string(&output).expect("output should be readable");
    assert!(csv.contains("(EPSG:28407)"), "unexpected output: {csv}");
}

#[test]
fn cli_export_writes_normalized_table() {
    let dir = tempdir().expect("tempdir should be created");
    let input = common::write_fixture(dir.path(), "points.txt", "Name\tLon\tLat\nA\t10\t20\n");
    let output = dir.path().join("normalized.csv");

    let status = Command::new(env!("CARGO_BIN_EXE_csv2crs"))
        .args([
            "export",
            "-i",
            &input.to_string_lossy(),
            "-o",
            &output.to_string_lossy(),
        ])
        .status()
        .expect("CLI should run");
    assert!(status.success());

    let csv = std::fs::read_to_string(&output).expect("output should be readable");
    assert_eq!(csv, "ID,Name,X,Y\n1,\"A\",10,20\n");
}

#[test]
fn cli_systems_searches_the_catalog() {
    let outcome = Command::new(env!("CARGO_BIN_EXE_csv2crs"))
        .args(["systems", "--query", "4326"])
        .output()
        .expect("CLI should run");
    assert!(outcome.status.success());

    let stdout = String::from_utf8(outcome.stdout).expect("stdout is UTF-8");
    assert!(stdout.contains("WGS 84"), "unexpected stdout: {stdout}");

    let missing = Command::new(env!("CARGO_BIN_EXE_csv2crs"))
        .args(["systems", "--query", "no-such-system"])
        .output()
        .expect("CLI should run");
    assert_eq!(missing.status.code(), Some(2));
}

#[test]
fn cli_rejects_unknown_extension_with_diagnostic() {
    let dir = tempdir().expect("tempdir should be created");
    let input = common::write_fixture(dir.path(), "points.xls", "Точка,X,Y\nA,1,2\n");

    let outcome = Command::new(env!("CARGO_BIN_EXE_csv2crs"))
        .args([
            "convert",
            "-i",
            &input.to_string_lossy(),
            "-s",
            "WGS 84",
            "-t",
            "UTM 36N",
        ])
        .output()
        .expect("CLI should run");
    assert_eq!(outcome.status.code(), Some(1));

    let stderr = String::from_utf8(outcome.stderr).expect("stderr is UTF-8");
    assert!(stderr.contains("xls"), "unexpected stderr: {stderr}");
}
