//! Error types for `moving-window`
//!
//! One error enum per concern (trial construction, configuration, replay
//! scripts, list randomization), aggregated by [`MovingWindowError`] which
//! also owns the process exit code mapping.

use std::path::PathBuf;
use thiserror::Error;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `moving-window` CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Configuration error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Trial construction or replay error
    pub const TRIAL_ERROR: i32 = 5;

    /// Stimulus list could not be randomized under the given constraint
    pub const RANDOMIZE_ERROR: i32 = 6;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `moving-window` operations.
#[derive(Debug, Error)]
pub enum MovingWindowError {
    /// Trial construction error
    #[error(transparent)]
    Trial(#[from] TrialError),

    /// Configuration loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Replay script error
    #[error(transparent)]
    Script(#[from] ScriptError),

    /// Constrained randomization error
    #[error(transparent)]
    Randomize(#[from] RandomizeError),

    /// Invalid command-line usage
    #[error("usage error: {0}")]
    Usage(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl MovingWindowError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Trial(_) | Self::Script(_) => ExitCode::TRIAL_ERROR,
            Self::Randomize(_) => ExitCode::RANDOMIZE_ERROR,
            Self::Usage(_) => ExitCode::USAGE_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Trial Errors
// ============================================================================

/// Errors raised while constructing or activating a trial controller.
///
/// Nothing on the interactive path (pointer input, premature continue)
/// produces an error; those are silent no-ops.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TrialError {
    /// Sentence text contained no words after whitespace trimming
    #[error("sentence text is empty")]
    EmptySentence,

    /// A visual or timing parameter is out of range
    #[error("invalid trial parameter '{name}': {reason}")]
    InvalidParameter {
        /// Parameter name (e.g. `"font_size"`)
        name: &'static str,
        /// Why the value was rejected
        reason: String,
    },

    /// `activate` was called on a controller that already rendered
    #[error("trial controller already activated")]
    AlreadyActivated,
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// YAML parsing failed
    #[error("parse error in {path}: {message}")]
    ParseError {
        /// Path to the configuration file
        path: PathBuf,
        /// Line number where the error occurred (if available)
        line: Option<usize>,
        /// Error message from the parser
        message: String,
    },

    /// Configuration validation failed
    #[error("validation failed for {path}")]
    ValidationError {
        /// Path to the configuration file
        path: String,
        /// List of validation issues found
        errors: Vec<ValidationIssue>,
    },

    /// Referenced configuration file not found
    #[error("file not found: {path}")]
    MissingFile {
        /// Path to the missing file
        path: PathBuf,
    },

    /// Configuration file exceeds the size limit
    #[error("configuration too large: {size} bytes (limit: {limit})")]
    TooLarge {
        /// Actual size in bytes
        size: usize,
        /// Configured limit in bytes
        limit: usize,
    },

    /// Environment variable referenced in configuration is not set
    #[error("environment variable '{var}' not set (referenced at {location})")]
    EnvVarNotSet {
        /// Name of the environment variable
        var: String,
        /// Location in the configuration where it was referenced
        location: String,
    },
}

// ============================================================================
// Validation Types
// ============================================================================

/// A single validation issue found during configuration validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    /// Path to the problematic field (e.g., "overlay.width")
    pub path: String,
    /// Description of the validation issue
    pub message: String,
    /// Severity level of the issue
    pub severity: Severity,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {} at {}", prefix, self.message, self.path)
    }
}

/// Severity level for validation issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Error - validation failure that prevents configuration from being used
    Error,
    /// Warning - potential issue that does not prevent configuration loading
    Warning,
}

// ============================================================================
// Script Errors
// ============================================================================

/// Replay script errors.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// Script YAML could not be parsed
    #[error("invalid replay script: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Steps are not in chronological order
    #[error("step {index} at {at_ms}ms precedes the previous step at {previous_ms}ms")]
    OutOfOrder {
        /// Zero-based step index
        index: usize,
        /// Step timestamp
        at_ms: f64,
        /// Timestamp of the step before it
        previous_ms: f64,
    },

    /// A step timestamp is negative or not finite
    #[error("step {index} has invalid timestamp {at_ms}")]
    InvalidTimestamp {
        /// Zero-based step index
        index: usize,
        /// Offending timestamp
        at_ms: f64,
    },

    /// A step hovers a word the sentence does not have
    #[error("step {step} hovers word {index}, but the sentence has {words} words")]
    UnknownWord {
        /// Zero-based step index
        step: usize,
        /// Requested word index
        index: usize,
        /// Number of words in the sentence
        words: usize,
    },

    /// The trial itself could not be built
    #[error(transparent)]
    Trial(#[from] TrialError),
}

// ============================================================================
// Randomization Errors
// ============================================================================

/// Constrained list randomization errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RandomizeError {
    /// No ordering satisfies the run-length constraint
    #[error(
        "unable to order {items} items with at most {max_run} consecutive items per category"
    )]
    Unsatisfiable {
        /// Number of items in the list
        items: usize,
        /// Requested maximum run length
        max_run: usize,
    },

    /// A maximum run length of zero admits no ordering
    #[error("maximum run length must be at least 1")]
    ZeroRunLength,
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `moving-window` operations.
pub type Result<T> = std::result::Result<T, MovingWindowError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::TRIAL_ERROR, 5);
        assert_eq!(ExitCode::RANDOMIZE_ERROR, 6);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_trial_error_exit_code() {
        let err: MovingWindowError = TrialError::EmptySentence.into();
        assert_eq!(err.exit_code(), ExitCode::TRIAL_ERROR);
    }

    #[test]
    fn test_randomize_error_exit_code() {
        let err: MovingWindowError = RandomizeError::Unsatisfiable {
            items: 3,
            max_run: 1,
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::RANDOMIZE_ERROR);
    }

    #[test]
    fn test_config_error_exit_code() {
        let err: MovingWindowError = ConfigError::MissingFile {
            path: PathBuf::from("/test"),
        }
        .into();
        assert_eq!(err.exit_code(), ExitCode::CONFIG_ERROR);
    }

    #[test]
    fn test_io_error_exit_code() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "not found");
        let err: MovingWindowError = io_err.into();
        assert_eq!(err.exit_code(), ExitCode::IO_ERROR);
    }

    #[test]
    fn test_usage_error_exit_code() {
        let err = MovingWindowError::Usage("bad flag".to_string());
        assert_eq!(err.exit_code(), ExitCode::USAGE_ERROR);
    }

    #[test]
    fn test_validation_issue_display() {
        let issue = ValidationIssue {
            path: "overlay.width".to_string(),
            message: "must not be negative".to_string(),
            severity: Severity::Error,
        };
        assert_eq!(
            issue.to_string(),
            "error: must not be negative at overlay.width"
        );
    }

    #[test]
    fn test_validation_issue_warning_display() {
        let issue = ValidationIssue {
            path: "width".to_string(),
            message: "zero width means auto".to_string(),
            severity: Severity::Warning,
        };
        assert_eq!(issue.to_string(), "warning: zero width means auto at width");
    }

    #[test]
    fn test_invalid_parameter_display() {
        let err = TrialError::InvalidParameter {
            name: "font_size",
            reason: "must be positive".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "invalid trial parameter 'font_size': must be positive"
        );
    }

    #[test]
    fn test_config_error_env_var_display() {
        let err = ConfigError::EnvVarNotSet {
            var: "TRIAL_FONT".to_string(),
            location: "font".to_string(),
        };
        assert!(err.to_string().contains("TRIAL_FONT"));
        assert!(err.to_string().contains("font"));
    }
}
