//! CLI argument definitions
//!
//! All Clap derive structs for `moving-window` command-line parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::randomize::DEFAULT_MAX_RUN;

// ============================================================================
// Root CLI
// ============================================================================

/// Moving-window self-paced reading trials.
#[derive(Parser, Debug)]
#[command(name = "moving-window", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all non-error output.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "MOVING_WINDOW_COLOR")]
    pub color: ColorChoice,

    /// Log line format.
    #[arg(long, default_value = "human", global = true)]
    pub log_format: LogFormatArg,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay or validate reading trials.
    Trial(TrialCommand),

    /// Derive dwell times and word geometry from trial results.
    Measures(MeasuresArgs),

    /// Order a stimulus list under a run-length constraint.
    Shuffle(ShuffleArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Trial Command
// ============================================================================

/// Trial commands.
#[derive(Args, Debug)]
pub struct TrialCommand {
    /// Trial subcommand.
    #[command(subcommand)]
    pub subcommand: TrialSubcommand,
}

/// Trial subcommands.
#[derive(Subcommand, Debug)]
pub enum TrialSubcommand {
    /// Replay a scripted trial headlessly and print its result.
    Run(TrialRunArgs),

    /// Validate trial configuration files.
    Validate(TrialValidateArgs),
}

/// Arguments for `trial run`.
#[derive(Args, Debug)]
pub struct TrialRunArgs {
    /// Path to the replay script.
    #[arg(short, long)]
    pub script: PathBuf,

    /// Path to a trial configuration file.
    #[arg(short, long, env = "MOVING_WINDOW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the minimum trial duration (e.g. `3s`, `2500ms`).
    #[arg(long, value_parser = humantime::parse_duration)]
    pub min_duration: Option<Duration>,

    /// Write lifecycle events as JSONL to this file (`-` for stderr).
    #[arg(long, env = "MOVING_WINDOW_EVENTS_FILE")]
    pub events: Option<PathBuf>,

    /// Write the result JSON to this file instead of stdout.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for `trial validate`.
#[derive(Args, Debug)]
pub struct TrialValidateArgs {
    /// Configuration files to validate.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Treat warnings as errors.
    #[arg(long)]
    pub strict: bool,
}

// ============================================================================
// Analysis / Randomization
// ============================================================================

/// Arguments for `measures`.
#[derive(Args, Debug)]
pub struct MeasuresArgs {
    /// Result files, each holding one trial result or a list of them.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

/// Arguments for `shuffle`.
#[derive(Args, Debug)]
pub struct ShuffleArgs {
    /// YAML stimulus list.
    pub stimuli: PathBuf,

    /// Maximum number of same-type items in a row.
    #[arg(long, default_value_t = DEFAULT_MAX_RUN)]
    pub max_run: usize,

    /// Seed for a reproducible order.
    #[arg(long, env = "MOVING_WINDOW_SEED")]
    pub seed: Option<u64>,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum LogFormatArg {
    /// Human-readable lines.
    #[default]
    Human,
    /// One JSON object per line.
    Json,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
