//! CLI integration tests for flowtrace.

use std::fs;
use std::time::Duration;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const TEST_TIMEOUT_SECS: u64 = 30;

/// Get a Command for our binary with timeout.
fn flowtrace() -> Command {
    let mut cmd = Command::cargo_bin("flowtrace").unwrap();
    cmd.timeout(Duration::from_secs(TEST_TIMEOUT_SECS));
    cmd
}

fn write_csv(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

const TRIANGLE_CSV: &str = "\
transaction_id,sender_id,receiver_id,amount,timestamp
T1,A,B,1000,2024-03-01T10:00:00Z
T2,B,C,1000,2024-03-01T11:00:00Z
T3,C,A,1000,2024-03-01T12:00:00Z
";

// ==========================================================================
// Help and Version Tests
// ==========================================================================

#[test]
fn test_help_flag() {
    flowtrace()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Forensic analysis of transaction networks",
        ));
}

#[test]
fn test_version_flag() {
    flowtrace()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("flowtrace"));
}

#[test]
fn test_no_subcommand_shows_usage() {
    flowtrace()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

// ==========================================================================
// Analyze Command Tests
// ==========================================================================

#[test]
fn test_analyze_to_stdout() {
    let dir = TempDir::new().unwrap();
    let input = write_csv(&dir, "txns.csv", TRIANGLE_CSV);

    let output = flowtrace()
        .arg("analyze")
        .arg(&input)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["summary"]["total_accounts_analyzed"], 3);
    assert_eq!(report["summary"]["fraud_rings_detected"], 1);
    assert_eq!(report["fraud_rings"][0]["ring_id"], "RING_001");
    assert_eq!(report["fraud_rings"][0]["pattern_type"], "cycle_length_3");
    assert!(report["_graph"]["nodes"].as_array().unwrap().len() == 3);
}

#[test]
fn test_analyze_to_file_pretty() {
    let dir = TempDir::new().unwrap();
    let input = write_csv(&dir, "txns.csv", TRIANGLE_CSV);
    let report_path = dir.path().join("report.json");

    flowtrace()
        .arg("analyze")
        .arg(&input)
        .arg("--output")
        .arg(&report_path)
        .arg("--pretty")
        .assert()
        .success();

    let contents = fs::read_to_string(&report_path).unwrap();
    assert!(contents.contains('\n'), "pretty output is multi-line");
    let report: serde_json::Value = serde_json::from_str(&contents).unwrap();
    assert_eq!(report["summary"]["suspicious_accounts_flagged"], 3);
}

#[test]
fn test_missing_column_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_csv(
        &dir,
        "bad.csv",
        "transaction_id,sender_id,receiver_id,amount\nT1,A,B,10\n",
    );

    flowtrace()
        .arg("analyze")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing required column 'timestamp'"));
}

#[test]
fn test_bad_cell_fails() {
    let dir = TempDir::new().unwrap();
    let input = write_csv(
        &dir,
        "bad.csv",
        "transaction_id,sender_id,receiver_id,amount,timestamp\nT1,A,B,banana,2024-01-01\n",
    );

    flowtrace()
        .arg("analyze")
        .arg(&input)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Parse error"));
}

#[test]
fn test_missing_file_fails() {
    flowtrace()
        .arg("analyze")
        .arg("no_such_file.csv")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot open transaction file"));
}

#[test]
fn test_cycle_budget_flag() {
    let dir = TempDir::new().unwrap();
    let input = write_csv(&dir, "txns.csv", TRIANGLE_CSV);

    let output = flowtrace()
        .arg("analyze")
        .arg(&input)
        .arg("--cycle-budget")
        .arg("1")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    // The lone triangle fits in a budget of one examined cycle.
    let report: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(report["summary"]["fraud_rings_detected"], 1);
}
