//! `measures` command handler.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::analysis;
use crate::cli::args::{MeasuresArgs, OutputFormat};
use crate::error::MovingWindowError;
use crate::trial::TrialResult;

/// A result file holds either one trial or a list of them.
#[derive(Deserialize)]
#[serde(untagged)]
enum ResultFile {
    One(TrialResult),
    Many(Vec<TrialResult>),
}

/// Derive reading measures from trial result files.
///
/// Trials are numbered in the order they are read, across files.
///
/// # Errors
///
/// Returns an I/O error if a file cannot be read or a JSON error if it
/// does not hold trial results.
pub fn run(args: &MeasuresArgs) -> Result<(), MovingWindowError> {
    let mut results = Vec::new();
    for path in &args.files {
        results.extend(read_results(path)?);
    }
    let measures = analysis::derive(&results);
    info!(
        trials = results.len(),
        dwells = measures.dwells.len(),
        "reading measures derived"
    );

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&measures)?),
        OutputFormat::Human => {
            println!("trial\tindex\tword\tenter_ms\tleave_ms\tduration_ms\tmeasure");
            for d in &measures.dwells {
                println!(
                    "{}\t{}\t{}\t{:.1}\t{:.1}\t{:.1}\t{}",
                    d.trial, d.index, d.text, d.enter_ms, d.leave_ms, d.duration_ms, d.measure
                );
            }
        }
    }
    Ok(())
}

fn read_results(path: &Path) -> Result<Vec<TrialResult>, MovingWindowError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(match serde_json::from_str(&raw)? {
        ResultFile::One(result) => vec![result],
        ResultFile::Many(results) => results,
    })
}
