//! CLI integration tests
//!
//! These tests verify that the CLI works correctly with various options.

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::PathBuf;

/// Get the path to the sample project fixture
fn sample_project() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/sample_project")
}

fn deadbind() -> Command {
    Command::cargo_bin("deadbind").expect("binary should build")
}

// ============================================================================
// Basic CLI Tests
// ============================================================================

#[test]
fn test_help() {
    deadbind()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--source-include"))
        .stdout(predicate::str::contains("--stdout"));
}

#[test]
fn test_stdout_markdown_report() {
    deadbind()
        .arg(sample_project())
        .arg("--stdout")
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("# Unused ViewModel Methods Report"))
        .stdout(predicate::str::contains("- **com.example.CompletelyUnusedViewModel**"))
        .stdout(predicate::str::contains("- Method: `anUnusedCommand` (line 12)"))
        .stdout(predicate::str::contains("submitOrder").not());
}

#[test]
fn test_writes_report_file() {
    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("report.md");

    deadbind()
        .arg(sample_project())
        .arg("--output")
        .arg(&output)
        .arg("--quiet")
        .assert()
        .success();

    let report = std::fs::read_to_string(&output).unwrap();
    assert!(report.contains("## Unused Methods in Active ViewModels"));
    assert!(report.contains("### ViewModel: `com.example.UserViewModel`"));
}

#[test]
fn test_json_format() {
    let assert = deadbind()
        .arg(sample_project())
        .args(["--stdout", "--quiet", "--format", "json"])
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).into_owned();
    let value: serde_json::Value = serde_json::from_str(&stdout).expect("valid JSON");
    assert_eq!(value["summary"]["unused_classes"], 1);
    assert_eq!(value["summary"]["unused_methods"], 7);
}

#[test]
fn test_retain_flag() {
    deadbind()
        .arg(sample_project())
        .args(["--stdout", "--quiet", "--retain", "UserViewModel.unusedMethod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unusedMethod").not())
        .stdout(predicate::str::contains("processInternalData"));
}

#[test]
fn test_template_exclude_changes_findings() {
    // Without quotetest.zul the QuoteTestViewModel is no longer bound anywhere
    deadbind()
        .arg(sample_project())
        .args(["--stdout", "--quiet", "--template-exclude", "**/quotetest.zul"])
        .assert()
        .success()
        .stdout(predicate::str::contains("- **com.example.QuoteTestViewModel**"));
}

// ============================================================================
// Failure modes
// ============================================================================

#[test]
fn test_no_sources_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.zul"), "<div/>").unwrap();

    deadbind()
        .arg(dir.path())
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("no source files found"));
}

#[test]
fn test_missing_root_fails() {
    deadbind()
        .arg("/definitely/not/a/project")
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("configuration error"));
}

#[test]
fn test_invalid_annotation_table_fails() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("deadbind.yml");
    std::fs::write(&config, "annotations:\n  command: []\n").unwrap();

    deadbind()
        .arg(sample_project())
        .arg("--config")
        .arg(&config)
        .arg("--stdout")
        .assert()
        .failure()
        .stderr(predicate::str::contains("annotations.command"));
}

#[test]
fn test_findings_do_not_change_exit_code() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("OrphanViewModel.java"),
        "package p; public class OrphanViewModel { public void x() {} }",
    )
    .unwrap();
    std::fs::write(dir.path().join("broken.zul"), "<window>").unwrap();

    deadbind()
        .arg(dir.path())
        .arg("--stdout")
        .arg("--quiet")
        .assert()
        .success()
        .stdout(predicate::str::contains("p.OrphanViewModel"))
        .stdout(predicate::str::contains("## Analysis Diagnostics"));
}
