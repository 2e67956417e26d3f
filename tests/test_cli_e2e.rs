mod common;

use std::collections::BTreeMap;

use common::{fixture, run, stdout_json};
use moving_window::error::ExitCode;

// ============================================================================
// measures command
// ============================================================================

fn replay_to_file(script: &str, path: &std::path::Path) {
    let output = run(&[
        "trial",
        "run",
        "--script",
        &fixture(script),
        "--output",
        path.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "trial run should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn measures_from_replayed_trial() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("result.json");
    replay_to_file("scripts/regression.yaml", &result);

    let output = run(&["measures", "--format", "json", result.to_str().unwrap()]);
    assert!(
        output.status.success(),
        "measures should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let measures = stdout_json(&output);
    let dwells: Vec<(u64, &str)> = measures["dwells"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| (d["index"].as_u64().unwrap(), d["measure"].as_str().unwrap()))
        .collect();
    assert_eq!(
        dwells,
        [
            (0, "first_pass"),
            (1, "first_pass"),
            (2, "first_pass"),
            (1, "second_pass"),
            (2, "second_pass"),
            (3, "first_pass"),
            (4, "first_pass"),
        ]
    );
    assert_eq!(measures["dwells"][0]["durationMs"], 200.0);
    assert_eq!(measures["geometry"].as_array().unwrap().len(), 5);
}

#[test]
fn measures_numbers_trials_across_files() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("first.json");
    let second = dir.path().join("second.json");
    replay_to_file("scripts/cat_sat.yaml", &first);
    replay_to_file("scripts/regression.yaml", &second);

    let output = run(&[
        "measures",
        "--format",
        "json",
        first.to_str().unwrap(),
        second.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let measures = stdout_json(&output);
    let mut per_trial: BTreeMap<u64, usize> = BTreeMap::new();
    for row in measures["geometry"].as_array().unwrap() {
        *per_trial.entry(row["trial"].as_u64().unwrap()).or_default() += 1;
    }
    assert_eq!(per_trial, BTreeMap::from([(0, 3), (1, 5)]));
}

#[test]
fn measures_human_table() {
    let dir = tempfile::tempdir().unwrap();
    let result = dir.path().join("result.json");
    replay_to_file("scripts/cat_sat.yaml", &result);

    let output = run(&["measures", result.to_str().unwrap()]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3, "header plus two dwells: {stdout}");
    assert!(lines[1].contains("The"));
    assert!(lines[2].contains("sat."));
}

#[test]
fn measures_rejects_non_result_json() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("bogus.json");
    std::fs::write(&bogus, r#"{"hello": "world"}"#).unwrap();

    let output = run(&["measures", bogus.to_str().unwrap()]);
    assert!(!output.status.success());
}

// ============================================================================
// shuffle command
// ============================================================================

fn item_types(list: &serde_json::Value) -> Vec<String> {
    list.as_array()
        .unwrap()
        .iter()
        .map(|item| item["item_type"].as_str().unwrap().to_owned())
        .collect()
}

#[test]
fn shuffle_respects_max_run() {
    let output = run(&[
        "shuffle",
        &fixture("stimuli/list.yaml"),
        "--max-run",
        "1",
        "--seed",
        "11",
    ]);
    assert!(
        output.status.success(),
        "shuffle should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let list = stdout_json(&output);
    let types = item_types(&list);
    assert_eq!(types.len(), 9);
    assert!(
        types.windows(2).all(|w| w[0] != w[1]),
        "no type may repeat: {types:?}"
    );

    let mut ids: Vec<u64> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|item| item["id"].as_u64().unwrap())
        .collect();
    ids.sort_unstable();
    assert_eq!(ids, (1..=9).collect::<Vec<_>>());
}

#[test]
fn shuffle_same_seed_same_order() {
    let args = ["shuffle", &fixture("stimuli/list.yaml"), "--seed", "2024"];
    let a = run(&args);
    let b = run(&args);
    assert!(a.status.success());
    assert_eq!(a.stdout, b.stdout);
}

#[test]
fn shuffle_unsatisfiable_list() {
    let output = run(&["shuffle", &fixture("stimuli/one_type.yaml")]);
    assert_eq!(output.status.code(), Some(ExitCode::RANDOMIZE_ERROR));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unable to order"), "stderr: {stderr}");
}

// ============================================================================
// version / completions
// ============================================================================

#[test]
fn version_human() {
    let output = run(&["version"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("moving-window "), "stdout: {stdout}");
}

#[test]
fn version_json() {
    let output = run(&["version", "--format", "json"]);
    assert!(output.status.success());
    let parsed = stdout_json(&output);
    assert_eq!(parsed["name"], "moving-window");
    assert!(parsed["version"].is_string());
}

#[test]
fn completions_bash() {
    let output = run(&["completions", "bash"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("moving-window"), "bash completions: {stdout}");
}

#[test]
fn unknown_subcommand_fails() {
    let output = run(&["frobnicate"]);
    assert!(!output.status.success());
}
