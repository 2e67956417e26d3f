//! Trial command handlers
//!
//! Implements `trial run` and `trial validate`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cli::args::{OutputFormat, TrialRunArgs, TrialValidateArgs};
use crate::config::{ConfigLoader, LoadWarning};
use crate::error::{ConfigError, MovingWindowError, Severity, ValidationIssue};
use crate::observability::events::EventEmitter;
use crate::observability::logging::trial_span;
use crate::script::{Script, replay};
use crate::trial::TrialParams;

/// `--events` value that sends lifecycle events to stderr.
const STDERR_PATH: &str = "-";

/// Replay a scripted trial and print its result.
///
/// Prints `null` when the script never completes the trial.
///
/// # Errors
///
/// Returns a config error if `--config` is invalid, a script error if the
/// script cannot be parsed or replayed, or an I/O error if the events or
/// output file cannot be written. `--output` and `--events` naming the
/// same file is a usage error.
pub fn run(args: &TrialRunArgs) -> Result<(), MovingWindowError> {
    let events_to_stderr = args.events.as_deref() == Some(Path::new(STDERR_PATH));
    if let (Some(output), Some(events)) = (&args.output, &args.events) {
        if !events_to_stderr && resolve(output) == resolve(events) {
            return Err(MovingWindowError::Usage(format!(
                "--output and --events both name {}",
                output.display()
            )));
        }
    }

    let mut params = match args.config {
        Some(ref path) => {
            info!(config = %path.display(), "loading trial configuration");
            let load_result = ConfigLoader::with_defaults().load(path)?;
            log_warnings(&load_result.warnings);
            load_result.params
        }
        None => TrialParams::default(),
    };
    if let Some(min_duration) = args.min_duration {
        params.min_duration_ms = min_duration.as_secs_f64() * 1000.0;
    }

    info!(script = %args.script.display(), "loading replay script");
    let script = Script::load(&args.script)?;

    let emitter = match args.events {
        Some(_) if events_to_stderr => Some(Arc::new(EventEmitter::stderr())),
        Some(ref path) => Some(Arc::new(EventEmitter::from_file(path)?)),
        None => None,
    };

    let span = trial_span(
        &args.script.display().to_string(),
        script.sentence.split_whitespace().count(),
    );
    let report = span.in_scope(|| replay(&script, params, emitter))?;
    for refusal in &report.refusals {
        debug!(reason = refusal.as_str(), "continue refused during replay");
    }
    if report.result.is_none() {
        warn!(
            reveal_state = ?report.reveal_state,
            refusals = report.refusals.len(),
            "trial did not complete"
        );
    }
    if report.skipped_steps > 0 {
        info!(
            skipped = report.skipped_steps,
            "steps after completion were ignored"
        );
    }

    let json = serde_json::to_string_pretty(&report.result)?;
    match args.output {
        Some(ref path) => std::fs::write(path, format!("{json}\n"))?,
        None => println!("{json}"),
    }
    Ok(())
}

/// Per-file validation outcome for JSON output.
#[derive(Debug, Serialize)]
struct FileReport {
    path: String,
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

/// Validate trial configuration files.
///
/// Every file is checked and reported before the first failure is
/// returned.
///
/// # Errors
///
/// Returns the first failure in argument order: an I/O error for a file
/// that does not exist, or a config error for a file that fails
/// validation (or has warnings under `--strict`).
pub fn validate(args: &TrialValidateArgs) -> Result<(), MovingWindowError> {
    let loader = ConfigLoader::with_defaults();
    let mut reports = Vec::with_capacity(args.files.len());
    let mut first_failure: Option<MovingWindowError> = None;

    for path in &args.files {
        if !path.exists() {
            warn!(file = %path.display(), "configuration file not found");
            let message = format!("file not found: {}", path.display());
            reports.push(FileReport {
                path: path.display().to_string(),
                valid: false,
                errors: vec![message.clone()],
                warnings: Vec::new(),
            });
            first_failure.get_or_insert_with(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, message).into()
            });
            continue;
        }
        info!(file = %path.display(), "validating configuration");

        let (report, failure) = check_file(&loader, path, args.strict);
        if let Some(failure) = failure {
            first_failure.get_or_insert_with(|| failure.into());
        }
        reports.push(report);
    }

    match args.format {
        OutputFormat::Human => {
            for report in &reports {
                let status = if report.valid { "ok" } else { "FAILED" };
                println!("{}: {status}", report.path);
                for error in &report.errors {
                    println!("  error: {error}");
                }
                for warning in &report.warnings {
                    println!("  warning: {warning}");
                }
            }
        }
        OutputFormat::Json => {
            let valid = reports.iter().filter(|r| r.valid).count();
            let output = serde_json::json!({
                "files": reports,
                "summary": { "valid": valid, "invalid": reports.len() - valid },
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    first_failure.map_or(Ok(()), Err)
}

fn check_file(loader: &ConfigLoader, path: &Path, strict: bool) -> (FileReport, Option<ConfigError>) {
    let display = path.display().to_string();
    match loader.load(path) {
        Ok(result) => {
            log_warnings(&result.warnings);
            let warnings: Vec<String> = result.warnings.iter().map(ToString::to_string).collect();
            let failure = (strict && !result.warnings.is_empty()).then(|| {
                ConfigError::ValidationError {
                    path: display.clone(),
                    errors: result
                        .warnings
                        .iter()
                        .map(|w| ValidationIssue {
                            path: w.location.clone().unwrap_or_default(),
                            message: w.message.clone(),
                            severity: Severity::Warning,
                        })
                        .collect(),
                }
            });
            let report = FileReport {
                path: display,
                valid: failure.is_none(),
                errors: Vec::new(),
                warnings,
            };
            (report, failure)
        }
        Err(e) => {
            let errors = match e {
                ConfigError::ValidationError { ref errors, .. } => {
                    errors.iter().map(ToString::to_string).collect()
                }
                ref other => vec![other.to_string()],
            };
            warn!(file = %path.display(), error = %e, "configuration invalid");
            let report = FileReport {
                path: display,
                valid: false,
                errors,
                warnings: Vec::new(),
            };
            (report, Some(e))
        }
    }
}

/// Absolute form of `path` for comparison. The file itself may not exist
/// yet, so only its directory has to.
fn resolve(path: &Path) -> PathBuf {
    if let Ok(path) = path.canonicalize() {
        return path;
    }
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    match (parent.canonicalize(), path.file_name()) {
        (Ok(dir), Some(name)) => dir.join(name),
        _ => path.to_path_buf(),
    }
}

fn log_warnings(warnings: &[LoadWarning]) {
    for warning in warnings {
        warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }
}
