//! Smoke tests for the `karma-bdd` binary.

use std::fs;
use std::path::Path;
use std::str;

use assert_cmd::Command;
use rstest::{fixture, rstest};
use serde_json::Value;
use tempfile::TempDir;

const FEATURE: &str = "\
#karma-bdd allowPending
Feature: Search
  Scenario: Empty query
    Given the search page
    When I search for nothing
  Scenario: Typo
    #karma-bdd fuzzy
    Given the search page
";

const EVENTS: &str = r#"{"name":"BeforeFeature","feature":{"name":"Search"}}
{"name":"BeforeScenario","scenario":{"name":"Empty query"}}
{"name":"BeforeStep","step":{"name":"the search page"}}
{"name":"StepResult","stepResult":{"status":"pending"}}
"#;

#[fixture]
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let nested = dir.path().join("features");
    fs::create_dir(&nested).expect("create features dir");
    fs::write(nested.join("search.feature"), FEATURE).expect("write feature");
    fs::write(dir.path().join("events.jsonl"), EVENTS).expect("write events");
    dir
}

fn karma_bdd(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("karma-bdd").expect("binary exists");
    cmd.current_dir(dir)
        .env_remove("KARMA_BDD_DIRECTIVE_MARKER")
        .env_remove("KARMA_BDD_ELAPSED_ORIGIN")
        .env_remove("KARMA_BDD_LATCH_FAILURES")
        .env_remove("KARMA_BDD_LOG_LEVEL");
    cmd
}

fn json_lines(stdout: &[u8]) -> Vec<Value> {
    str::from_utf8(stdout)
        .expect("utf8")
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect()
}

#[rstest]
fn directives_prints_settings(workspace: TempDir) {
    let output = karma_bdd(workspace.path())
        .args(["directives", "features"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    let settings: Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(settings["Search"]["Empty query"], serde_json::json!(["allowPending"]));
    assert_eq!(
        settings["Search"]["Typo"],
        serde_json::json!(["allowPending", "fuzzy"])
    );
}

#[rstest]
fn dry_run_reports_skipped_steps(workspace: TempDir) {
    let output = karma_bdd(workspace.path())
        .args(["dry-run", "features"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    let lines = json_lines(&output.stdout);
    let results: Vec<&Value> = lines.iter().filter(|v| v["type"] == "result").collect();
    assert_eq!(results.len(), 3);
    assert!(results.iter().all(|v| v["skipped"] == true));
    assert_eq!(lines.last().map(|v| v["type"].clone()), Some(Value::from("complete")));
}

#[rstest]
fn replay_applies_allow_pending(workspace: TempDir) {
    let output = karma_bdd(workspace.path())
        .args(["replay", "--events", "events.jsonl", "features"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    let lines = json_lines(&output.stdout);
    let result = lines
        .iter()
        .find(|v| v["type"] == "result")
        .expect("one result record");
    assert_eq!(result["success"], true);
    assert_eq!(result["description"], "Empty query");
    assert_eq!(result["suite"], serde_json::json!(["Search"]));
}

#[rstest]
fn missing_features_fail(workspace: TempDir) {
    let output = karma_bdd(workspace.path())
        .args(["dry-run", "events.jsonl"])
        .output()
        .expect("runs");
    assert!(!output.status.success());
    let stderr = str::from_utf8(&output.stderr).expect("utf8");
    assert!(stderr.contains("No .feature files were found"));
}

#[rstest]
fn invalid_log_level_is_rejected(workspace: TempDir) {
    let output = karma_bdd(workspace.path())
        .env("KARMA_BDD_LOG_LEVEL", "loud")
        .args(["directives", "features"])
        .output()
        .expect("runs");
    assert!(!output.status.success());
}

#[rstest]
fn empty_event_log_is_reported(workspace: TempDir) {
    fs::write(workspace.path().join("empty.jsonl"), "\n").expect("write empty log");
    let output = karma_bdd(workspace.path())
        .args(["replay", "--events", "empty.jsonl", "features"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    let stderr = str::from_utf8(&output.stderr).expect("utf8");
    assert!(stderr.contains("event log holds no events"), "{stderr}");
    let lines = json_lines(&output.stdout);
    assert!(lines.iter().all(|v| v["type"] != "result"));
}

#[rstest]
fn directives_logs_each_feature(workspace: TempDir) {
    let output = karma_bdd(workspace.path())
        .args(["--log-level", "info", "directives", "features"])
        .output()
        .expect("runs");
    assert!(output.status.success());
    let stderr = str::from_utf8(&output.stderr).expect("utf8");
    assert!(stderr.contains("collected directives"), "{stderr}");
    assert!(stderr.contains("feature=\"Search\""), "{stderr}");
}
