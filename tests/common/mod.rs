//! Shared integration-test helpers for running the `moving-window` binary.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};

/// Environment variables the binary reads; cleared so the caller's shell
/// cannot change test outcomes.
const CLEARED_ENV: &[&str] = &[
    "MOVING_WINDOW_CONFIG",
    "MOVING_WINDOW_EVENTS_FILE",
    "MOVING_WINDOW_SEED",
    "MOVING_WINDOW_LOG_LEVEL",
    "MOVING_WINDOW_MAX_CONFIG_SIZE",
];

/// Runs the binary with `args` and waits for it to exit.
#[allow(clippy::missing_panics_doc)]
pub fn run(args: &[&str]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_moving-window"));
    cmd.args(args).env("MOVING_WINDOW_COLOR", "never");
    for var in CLEARED_ENV {
        cmd.env_remove(var);
    }
    cmd.output().expect("failed to run moving-window")
}

/// Absolute path of a file under `tests/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// Same as [`fixture_path`], as a `String` for argument lists.
pub fn fixture(name: &str) -> String {
    fixture_path(name).to_string_lossy().into_owned()
}

/// Stdout parsed as JSON, with stderr in the panic message on failure.
#[allow(clippy::missing_panics_doc)]
pub fn stdout_json(output: &Output) -> serde_json::Value {
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(&stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not JSON ({e}): {stdout}\nstderr: {}",
            String::from_utf8_lossy(&output.stderr)
        )
    })
}
