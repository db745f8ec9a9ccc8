//! End-to-end behaviour of a run over feature files on disk.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use karma_bdd::sink::{CollectingSink, JsonLinesSink, SinkCall};
use karma_bdd::{ALLOW_PENDING, Config, DryRunEngine, ReplayEngine, Runner, RunnerError};
use rstest::{fixture, rstest};
use serde_json::Value;

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/features")
        .join(name)
}

#[fixture]
fn runner() -> Runner<karma_bdd::FsLoader> {
    let mut runner = Runner::from_fs(Config::default());
    runner
        .initialise([
            fixture_path("login.feature"),
            fixture_path("checkout.feature"),
            fixture_path("events.jsonl"),
        ])
        .expect("fixtures load");
    runner
}

#[rstest]
fn directives_are_scoped_per_scenario(runner: Runner<karma_bdd::FsLoader>) {
    let settings = runner.settings();
    assert!(settings.allows("Login", "Valid user", ALLOW_PENDING));
    assert!(settings.allows("Login", "Locked account", ALLOW_PENDING));
    assert!(settings.allows("Login", "Locked account", "slow"));
    assert!(!settings.allows("Login", "Valid user", "slow"));
    assert!(!settings.allows("Checkout", "Empty basket", ALLOW_PENDING));
    assert!(settings.allows("Checkout", "Paying by card", ALLOW_PENDING));
}

#[rstest]
fn dry_run_reports_every_step_as_skipped(runner: Runner<karma_bdd::FsLoader>) {
    let mut sink = CollectingSink::default();
    runner
        .run(&mut DryRunEngine, &mut sink)
        .expect("dry run succeeds");

    // login: 2 scenarios x (1 background + 2 steps); checkout: 2 + 1 steps.
    assert_eq!(sink.progress(), (1..=9).collect::<Vec<_>>());
    assert!(
        sink.results()
            .all(|report| report.skipped && !report.success && report.time == 0)
    );
    assert_eq!(sink.calls().last(), Some(&SinkCall::Complete));
}

#[rstest]
fn replayed_events_are_classified(runner: Runner<karma_bdd::FsLoader>) {
    let log = File::open(fixture_path("events.jsonl")).expect("event log opens");
    let mut engine = ReplayEngine::from_json_lines(BufReader::new(log)).expect("log decodes");
    let mut sink = JsonLinesSink::new(Vec::new());
    runner.run(&mut engine, &mut sink).expect("replay succeeds");

    let output = String::from_utf8(sink.finish().expect("reports flush")).expect("utf8");
    let lines: Vec<Value> = output
        .lines()
        .map(|line| serde_json::from_str(line).expect("valid json line"))
        .collect();
    let results: Vec<&Value> = lines.iter().filter(|v| v["type"] == "result").collect();
    assert_eq!(results.len(), 3);

    let successes: Vec<&Value> = results.iter().map(|v| &v["success"]).collect();
    assert_eq!(successes, [&Value::Bool(true), &Value::Bool(false), &Value::Bool(true)]);
    assert_eq!(results[1]["log"][0], "I see \"Your basket is empty\"\nbasket had 1 item");
    // The failure log is never cleared, so later records still carry it.
    assert_eq!(results[2]["log"].as_array().map(Vec::len), Some(1));
    assert_eq!(results[2]["suite"][0], "Checkout");
    assert_eq!(lines.last().map(|v| v["type"].clone()), Some(Value::from("complete")));
}

#[test]
fn directories_without_features_are_refused() {
    let dir = tempfile::tempdir().expect("tempdir");
    let notes = dir.path().join("notes.txt");
    fs::write(&notes, "Feature: not really").expect("write notes");
    let mut runner = Runner::from_fs(Config::default());
    let result = runner.initialise([notes]);
    assert!(matches!(result, Err(RunnerError::NoFeatureFiles)));
}

#[test]
fn custom_marker_reads_legacy_annotations() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("legacy.feature");
    fs::write(
        &path,
        "Feature: Legacy\n  Scenario: Old\n    #karma-cucumberjs allowPending\n",
    )
    .expect("write feature");
    let config = Config {
        directive_marker: "karma-cucumberjs".into(),
        ..Config::default()
    };
    let mut runner = Runner::from_fs(config);
    runner.initialise([&path]).expect("feature loads");
    assert!(runner.settings().allows("Legacy", "Old", ALLOW_PENDING));
}
