mod common;

use common::{fixture, run, stdout_json};
use moving_window::error::ExitCode;

// ============================================================================
// trial run
// ============================================================================

#[test]
fn run_prints_result_for_completed_script() {
    let output = run(&[
        "trial",
        "run",
        "--script",
        &fixture("scripts/cat_sat.yaml"),
        "--min-duration",
        "3s",
    ]);
    assert!(
        output.status.success(),
        "trial run should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let result = stdout_json(&output);
    let events = result["wordEvents"].as_array().expect("wordEvents array");
    let summary: Vec<(u64, &str, f64)> = events
        .iter()
        .map(|e| {
            (
                e["index"].as_u64().unwrap(),
                e["kind"].as_str().unwrap(),
                e["elapsedMs"].as_f64().unwrap(),
            )
        })
        .collect();
    assert_eq!(
        summary,
        [
            (0, "enter", 1200.0),
            (0, "leave", 1400.0),
            (2, "enter", 1600.0),
            (2, "leave", 1800.0),
        ]
    );

    let geometry = result["wordGeometry"].as_array().expect("wordGeometry array");
    let indices: Vec<u64> = geometry.iter().map(|g| g["index"].as_u64().unwrap()).collect();
    assert_eq!(indices, [0, 1, 2]);
    assert_eq!(geometry[2]["text"], "sat.");
}

#[test]
fn run_prints_null_when_trial_never_completes() {
    let output = run(&[
        "trial",
        "run",
        "--script",
        &fixture("scripts/early_continue.yaml"),
    ]);
    assert!(
        output.status.success(),
        "an incomplete trial is not an error: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "null");

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("did not complete"),
        "a warning should be logged: {stderr}"
    );
}

#[test]
fn config_minimum_duration_applies() {
    // The experiment profile needs 3000 ms; the script continues at 3000 ms.
    let output = run(&[
        "trial",
        "run",
        "--script",
        &fixture("scripts/regression.yaml"),
        "--config",
        &fixture("configs/experiment.yaml"),
    ]);
    assert!(output.status.success());
    assert!(stdout_json(&output).is_object());

    // One millisecond more than the script allows.
    let output = run(&[
        "trial",
        "run",
        "--script",
        &fixture("scripts/regression.yaml"),
        "--config",
        &fixture("configs/experiment.yaml"),
        "--min-duration",
        "3001ms",
    ]);
    assert!(output.status.success());
    assert!(stdout_json(&output).is_null());
}

#[test]
fn run_writes_output_and_events_files() {
    let dir = tempfile::tempdir().unwrap();
    let result_path = dir.path().join("result.json");
    let events_path = dir.path().join("events.jsonl");

    let output = run(&[
        "trial",
        "run",
        "--script",
        &fixture("scripts/cat_sat.yaml"),
        "--output",
        result_path.to_str().unwrap(),
        "--events",
        events_path.to_str().unwrap(),
    ]);
    assert!(
        output.status.success(),
        "trial run should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(output.stdout.is_empty(), "result should go to the file");

    let result: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&result_path).unwrap()).unwrap();
    assert_eq!(result["wordEvents"].as_array().unwrap().len(), 4);

    let events = std::fs::read_to_string(&events_path).unwrap();
    let types: Vec<String> = events
        .lines()
        .map(|line| {
            let event: serde_json::Value = serde_json::from_str(line).unwrap();
            event["type"].as_str().unwrap().to_owned()
        })
        .collect();
    assert_eq!(types.first().map(String::as_str), Some("TrialActivated"));
    assert!(types.iter().any(|t| t == "Revealed"));
    assert!(types.iter().any(|t| t == "TrialCompleted"));
}

#[test]
fn run_streams_events_to_stderr() {
    let output = run(&[
        "trial",
        "run",
        "--script",
        &fixture("scripts/cat_sat.yaml"),
        "--events",
        "-",
    ]);
    assert!(
        output.status.success(),
        "trial run should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert!(stdout_json(&output).is_object());

    let stderr = String::from_utf8_lossy(&output.stderr);
    let types: Vec<String> = stderr
        .lines()
        .filter_map(|line| serde_json::from_str::<serde_json::Value>(line).ok())
        .filter_map(|event| event["type"].as_str().map(str::to_owned))
        .collect();
    assert_eq!(types.first().map(String::as_str), Some("TrialActivated"));
    assert!(types.iter().any(|t| t == "TrialCompleted"));
    assert!(!std::path::Path::new("-").exists());
}

#[test]
fn run_rejects_shared_output_and_events_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trial.json");
    let path = path.to_str().unwrap();

    let output = run(&[
        "trial",
        "run",
        "--script",
        &fixture("scripts/cat_sat.yaml"),
        "--output",
        path,
        "--events",
        path,
    ]);
    assert_eq!(output.status.code(), Some(ExitCode::USAGE_ERROR));
    assert!(!std::path::Path::new(path).exists());
}

#[test]
fn run_rejects_same_file_spelled_differently() {
    let dir = tempfile::tempdir().unwrap();
    let output_path = dir.path().join("trial.json");
    let events_path = dir.path().join(".").join("trial.json");

    let output = run(&[
        "trial",
        "run",
        "--script",
        &fixture("scripts/cat_sat.yaml"),
        "--output",
        output_path.to_str().unwrap(),
        "--events",
        events_path.to_str().unwrap(),
    ]);
    assert_eq!(output.status.code(), Some(ExitCode::USAGE_ERROR));
    assert!(!output_path.exists());
}

#[test]
fn run_rejects_out_of_order_script() {
    let output = run(&[
        "trial",
        "run",
        "--script",
        &fixture("scripts/out_of_order.yaml"),
    ]);
    assert_eq!(output.status.code(), Some(ExitCode::TRIAL_ERROR));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("precedes"), "stderr: {stderr}");
}

#[test]
fn run_missing_script_is_io_error() {
    let output = run(&[
        "trial",
        "run",
        "--script",
        "/tmp/nonexistent_moving_window_script.yaml",
    ]);
    assert_eq!(output.status.code(), Some(ExitCode::IO_ERROR));
}

// ============================================================================
// trial validate
// ============================================================================

#[test]
fn validate_valid_configs() {
    let output = run(&[
        "trial",
        "validate",
        &fixture("configs/plugin.yaml"),
        &fixture("configs/experiment.yaml"),
    ]);
    assert!(
        output.status.success(),
        "validate should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.matches(": ok").count(), 2, "stdout: {stdout}");
}

#[test]
fn validate_reports_every_error() {
    let output = run(&["trial", "validate", &fixture("configs/invalid.yaml")]);
    assert_eq!(output.status.code(), Some(ExitCode::CONFIG_ERROR));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("font_size"), "stdout: {stdout}");
    assert!(stdout.contains("at font"), "stdout: {stdout}");
}

#[test]
fn validate_rejects_unknown_fields() {
    let output = run(&["trial", "validate", &fixture("configs/unknown_field.yaml")]);
    assert_eq!(output.status.code(), Some(ExitCode::CONFIG_ERROR));
    assert!(String::from_utf8_lossy(&output.stdout).contains("colour"));
}

#[test]
fn validate_empty_file_rejected() {
    let output = run(&["trial", "validate", &fixture("configs/empty.yaml")]);
    assert_eq!(output.status.code(), Some(ExitCode::CONFIG_ERROR));
    assert!(String::from_utf8_lossy(&output.stdout).contains("FAILED"));
}

#[test]
fn validate_strict_fails_on_warnings() {
    let config = fixture("configs/short_minimum.yaml");

    let lenient = run(&["trial", "validate", &config]);
    assert!(lenient.status.success());
    assert!(String::from_utf8_lossy(&lenient.stdout).contains("warning"));

    let strict = run(&["trial", "validate", "--strict", &config]);
    assert_eq!(strict.status.code(), Some(ExitCode::CONFIG_ERROR));
}

#[test]
fn validate_json_output() {
    let output = run(&[
        "trial",
        "validate",
        "--format",
        "json",
        &fixture("configs/plugin.yaml"),
        &fixture("configs/invalid.yaml"),
    ]);
    assert!(!output.status.success());

    let report = stdout_json(&output);
    assert_eq!(report["summary"]["valid"], 1);
    assert_eq!(report["summary"]["invalid"], 1);
    assert_eq!(report["files"][0]["valid"], true);
    assert!(!report["files"][1]["errors"].as_array().unwrap().is_empty());
}

#[test]
fn validate_missing_file() {
    let output = run(&[
        "trial",
        "validate",
        "/tmp/nonexistent_moving_window_config.yaml",
    ]);
    assert_eq!(output.status.code(), Some(ExitCode::IO_ERROR));
}

#[test]
fn validate_reports_every_file_despite_missing_one() {
    let output = run(&[
        "trial",
        "validate",
        "/tmp/nonexistent_moving_window_config.yaml",
        &fixture("configs/plugin.yaml"),
    ]);
    assert_eq!(output.status.code(), Some(ExitCode::IO_ERROR));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("nonexistent_moving_window_config.yaml: FAILED"), "stdout: {stdout}");
    assert!(stdout.contains("file not found"), "stdout: {stdout}");
    assert!(stdout.contains("plugin.yaml: ok"), "stdout: {stdout}");
}
