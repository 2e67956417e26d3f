//! Logging initialization.
//!
//! Structured logging via `tracing`, written to stderr so stdout stays free
//! for trial results. `-v` raises only this crate's level; everything else
//! stays at `warn` until `-vvv`. `MOVING_WINDOW_LOG_LEVEL` replaces the
//! computed filter entirely.
//!
//! Work on one trial runs inside a [`trial_span`], so every line logged
//! while it runs carries the trial's source and word count. JSON output
//! flattens the span onto each line; human output at `-vv` also reports
//! when the span closes, with its busy and idle time.

use std::io::IsTerminal;

use tracing::Span;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

use crate::cli::args::ColorChoice;

/// Environment variable that overrides the `-v` count.
pub const LOG_LEVEL_ENV: &str = "MOVING_WINDOW_LOG_LEVEL";

/// Log target of this crate.
const CRATE_TARGET: &str = "moving_window";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable format with optional ANSI colors.
    #[default]
    Human,
    /// Newline-delimited JSON, one object per event with the current
    /// trial span's fields.
    Json,
}

/// Filter directive for a `-v` count.
///
/// | count | directive |
/// |---|---|
/// | 0 | `warn` |
/// | 1 | `warn,moving_window=info` |
/// | 2 | `warn,moving_window=debug` |
/// | 3+ | `trace` |
#[must_use]
pub fn filter_directive(verbosity: u8) -> String {
    match verbosity {
        0 => "warn".to_owned(),
        1 => format!("warn,{CRATE_TARGET}=info"),
        2 => format!("warn,{CRATE_TARGET}=debug"),
        _ => "trace".to_owned(),
    }
}

/// Span covering the work on one trial.
///
/// `source` names where the trial came from (a script path, or a label
/// chosen by the host); `words` is the sentence length.
#[must_use]
pub fn trial_span(source: &str, words: usize) -> Span {
    tracing::info_span!("trial", source = %source, words)
}

/// Initializes the global tracing subscriber.
///
/// Uses `try_init()`, so a second call (e.g. from tests) is ignored.
pub fn init_logging(format: LogFormat, verbosity: u8, color: ColorChoice) {
    let filter = EnvFilter::try_from_env(LOG_LEVEL_ENV)
        .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbosity)));

    let show_target = verbosity >= 2;

    let use_ansi = match color {
        ColorChoice::Auto => {
            std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
        }
        ColorChoice::Always => true,
        ColorChoice::Never => false,
    };

    match format {
        LogFormat::Human => {
            let span_events = if verbosity >= 2 {
                FmtSpan::CLOSE
            } else {
                FmtSpan::NONE
            };
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(use_ansi)
                .with_target(show_target)
                .with_span_events(span_events)
                .with_writer(std::io::stderr)
                .try_init();
        }
        LogFormat::Json => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_target(show_target)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
}
