//! Tests for the `data-guard` binary.

use serde_json::json;
use std::io::Write;
use std::process::{Command, Output};
use tempfile::NamedTempFile;

fn request_file(body: serde_json::Value) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(body.to_string().as_bytes()).unwrap();
    file
}

fn data_guard(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_data-guard"))
        .args(args)
        .output()
        .unwrap()
}

fn payments(amounts: &[i64]) -> serde_json::Value {
    json!({
        "source_id": "payments",
        "schema": {"amount": "number"},
        "rules": [
            {"id": "positive", "field": "amount", "checks": [{"op": "gt", "value": 0}]},
            {"id": "currency", "field": "currency", "checks": [{"op": "regex", "value": "^[A-Z]{3}$"}]}
        ],
        "data": amounts
            .iter()
            .map(|a| json!({"amount": a, "currency": "EUR"}))
            .collect::<Vec<_>>()
    })
}

#[test]
fn test_validate_passing_batch_exits_zero() {
    let file = request_file(payments(&[1, 2, 3]));
    let output = data_guard(&["validate", "--input", file.path().to_str().unwrap(), "--no-color"]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Validation PASSED"));
    assert!(stdout.contains("Records checked: 3"));
}

#[test]
fn test_validate_failing_batch_exits_one() {
    let file = request_file(payments(&[1, -2, -3]));
    let output = data_guard(&[
        "validate",
        "--input",
        file.path().to_str().unwrap(),
        "--format",
        "json",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["status"], "FAIL");
    assert_eq!(report["rules_failed"], 2);
    assert_eq!(report["errors"][0]["rule_id"], "positive");
}

#[test]
fn test_validate_truncates_failures() {
    let file = request_file(payments(&[-1, -2, -3, -4]));
    let output = data_guard(&[
        "validate",
        "--input",
        file.path().to_str().unwrap(),
        "--no-color",
        "--max-errors",
        "1",
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Validation FAILED"));
    assert!(stdout.contains("... and 3 more failures"));
}

#[test]
fn test_bad_input_exits_two() {
    let file = request_file(json!({"data": []}));
    let output = data_guard(&["validate", "--input", file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("source_id is required"));

    let output = data_guard(&["validate", "--input", "/nonexistent/request.json"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("cannot read"));
}

#[test]
fn test_plan_reports_split_and_sql() {
    let file = request_file(payments(&[]));
    let output = data_guard(&["plan", "--input", file.path().to_str().unwrap(), "--table", "payments"]);

    assert!(output.status.success());
    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["sql_rules"], json!(["positive"]));
    assert_eq!(report["memory_rules"], json!(["currency"]));
    assert_eq!(
        report["sql"],
        r#"SELECT * FROM "payments" WHERE ("amount" IS NULL OR "amount" <= $1)"#
    );
    assert_eq!(report["args"], json!([0]));
}

#[test]
fn test_operators_lists_registry() {
    let output = data_guard(&["operators"]);

    assert!(output.status.success());
    let names: Vec<_> = String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect();
    assert_eq!(
        names,
        vec!["enum", "eq", "gt", "gte", "lt", "lte", "neq", "not_null", "regex"]
    );
}
