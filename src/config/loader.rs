//! Trial configuration loader.
//!
//! Loading pipeline:
//! 1. Size check against [`ConfigLimits::max_config_size`]
//! 2. Environment variable expansion (pre-parse, on raw text)
//! 3. YAML parsing into [`TrialConfig`]
//! 4. Validation
//! 5. Resolution into [`TrialParams`]

use std::path::Path;

use tracing::debug;

use crate::config::schema::TrialConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;
use crate::trial::model::TrialParams;

/// Environment variable overriding the configuration size limit.
pub const MAX_CONFIG_SIZE_ENV: &str = "MOVING_WINDOW_MAX_CONFIG_SIZE";

/// Default configuration size limit (1 MiB).
pub const DEFAULT_MAX_CONFIG_SIZE: usize = 1024 * 1024;

/// Limits for configuration input.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum configuration size in bytes.
    pub max_config_size: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_config_size: env_or(MAX_CONFIG_SIZE_ENV, DEFAULT_MAX_CONFIG_SIZE),
        }
    }
}

/// Result of loading a configuration.
#[derive(Debug)]
pub struct LoadResult {
    /// The parsed configuration as written.
    pub config: TrialConfig,

    /// The configuration resolved against its profile.
    pub params: TrialParams,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during configuration loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} (at {location})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Configuration loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    limits: ConfigLimits,
}

impl ConfigLoader {
    /// Creates a loader with the given limits.
    #[must_use]
    pub const fn new(limits: ConfigLimits) -> Self {
        Self { limits }
    }

    /// Creates a loader with default limits.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::default()
    }

    /// Loads, validates, and resolves a configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file exceeds the size limit
    /// - A required environment variable is unset
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        self.check_size(file_size)?;

        let raw = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        self.load_str(&raw, path)
    }

    /// Runs the pipeline on in-memory YAML. `source` is only used in
    /// error messages.
    ///
    /// # Errors
    ///
    /// As [`load`](Self::load), minus file access.
    pub fn load_str(&self, raw: &str, source: &Path) -> Result<LoadResult, ConfigError> {
        self.check_size(raw.len())?;
        let raw = raw.strip_prefix('\u{feff}').unwrap_or(raw);

        let mut env_sub = EnvSubstitution::new();
        let substituted = env_sub.substitute(raw, source)?;
        let mut warnings = env_sub.warnings;

        let value: serde_yaml::Value =
            serde_yaml::from_str(&substituted).map_err(|e| ConfigError::ParseError {
                path: source.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: e.to_string(),
            })?;
        if value.is_null() {
            return Err(ConfigError::ParseError {
                path: source.to_path_buf(),
                line: None,
                message: "Configuration file is empty".to_string(),
            });
        }

        let config: TrialConfig =
            serde_yaml::from_value(value).map_err(|e| ConfigError::ParseError {
                path: source.to_path_buf(),
                line: e.location().map(|l| l.line()),
                message: format!("Failed to deserialize configuration: {e}"),
            })?;

        let result = Validator::new().validate(&config);
        if result.has_errors() {
            return Err(ConfigError::ValidationError {
                path: source.display().to_string(),
                errors: result.errors,
            });
        }
        warnings.extend(result.warnings.into_iter().map(|issue| LoadWarning {
            message: issue.message,
            location: Some(issue.path),
        }));

        let params = config.to_params();
        debug!(
            source = %source.display(),
            warnings = warnings.len(),
            "trial configuration loaded"
        );

        Ok(LoadResult {
            config,
            params,
            warnings,
        })
    }

    const fn check_size(&self, size: usize) -> Result<(), ConfigError> {
        if size > self.limits.max_config_size {
            return Err(ConfigError::TooLarge {
                size,
                limit: self.limits.max_config_size,
            });
        }
        Ok(())
    }
}

// ============================================================================
// Environment Variable Substitution
// ============================================================================

/// Pre-parse environment variable substitution.
///
/// Runs on raw YAML text before parsing so substituted numbers keep their
/// YAML type.
struct EnvSubstitution {
    warnings: Vec<LoadWarning>,
}

type CharStream<'a> = std::iter::Peekable<std::str::Chars<'a>>;

impl EnvSubstitution {
    const fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Substitutes environment variables in raw YAML text.
    ///
    /// Supports:
    /// - `${VAR}` - expand to value (empty string if unset with warning)
    /// - `${VAR:-default}` - expand to default if unset
    /// - `${VAR:?message}` - fail if unset
    /// - `$$` - literal `$`
    fn substitute(&mut self, raw_yaml: &str, source: &Path) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(raw_yaml.len());
        let mut chars = raw_yaml.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                result.push(c);
                continue;
            }
            match chars.peek() {
                Some('$') => {
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let var = Self::parse_var_ref(&mut chars, source)?;
                    match std::env::var(&var.name) {
                        Ok(value) => result.push_str(&value),
                        Err(_) => match var.fallback {
                            Fallback::Default(default) => result.push_str(&default),
                            Fallback::Required(message) => {
                                return Err(ConfigError::EnvVarNotSet {
                                    var: var.name,
                                    location: message,
                                });
                            }
                            Fallback::Empty => {
                                self.warnings.push(LoadWarning {
                                    message: format!(
                                        "Environment variable '{}' is not set, using empty string",
                                        var.name
                                    ),
                                    location: Some(source.display().to_string()),
                                });
                            }
                        },
                    }
                }
                _ => result.push(c),
            }
        }

        Ok(result)
    }

    /// Parses the inside of `${...}`; the opening brace is consumed.
    fn parse_var_ref(chars: &mut CharStream<'_>, source: &Path) -> Result<VarRef, ConfigError> {
        let mut name = String::new();

        while let Some(c) = chars.next() {
            match c {
                '}' => {
                    return Ok(VarRef {
                        name,
                        fallback: Fallback::Empty,
                    });
                }
                ':' if chars.peek() == Some(&'-') => {
                    chars.next();
                    let default = Self::read_until_close(chars, source)?;
                    return Ok(VarRef {
                        name,
                        fallback: Fallback::Default(default),
                    });
                }
                ':' if chars.peek() == Some(&'?') => {
                    chars.next();
                    let message = Self::read_until_close(chars, source)?;
                    return Ok(VarRef {
                        name,
                        fallback: Fallback::Required(message),
                    });
                }
                _ => name.push(c),
            }
        }

        Err(unclosed(source, &name))
    }

    /// Reads content until the matching `}`, allowing nested braces.
    fn read_until_close(chars: &mut CharStream<'_>, source: &Path) -> Result<String, ConfigError> {
        let mut value = String::new();
        let mut depth = 1;

        for c in chars.by_ref() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(value);
                    }
                }
                _ => {}
            }
            value.push(c);
        }

        Err(unclosed(source, &value))
    }
}

struct VarRef {
    name: String,
    fallback: Fallback,
}

enum Fallback {
    Empty,
    Default(String),
    Required(String),
}

fn unclosed(source: &Path, fragment: &str) -> ConfigError {
    ConfigError::ParseError {
        path: source.to_path_buf(),
        line: None,
        message: format!("Unclosed environment variable reference: ${{{fragment}"),
    }
}

/// Parses an environment variable, falling back to `default`.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn substitute(raw: &str) -> (Result<String, ConfigError>, Vec<LoadWarning>) {
        let mut sub = EnvSubstitution::new();
        let result = sub.substitute(raw, Path::new("test.yaml"));
        (result, sub.warnings)
    }

    #[test]
    fn env_substitution_expands_set_variable() {
        // PATH is set on every supported platform
        let (result, warnings) = substitute("font: ${PATH}");
        let result = result.unwrap();
        assert!(!result.contains("${PATH}"));
        assert!(result.len() > "font: ".len());
        assert!(warnings.is_empty());
    }

    #[test]
    fn env_substitution_default() {
        let (result, _) = substitute("min_duration_ms: ${MOVING_WINDOW_TEST_UNSET_A1:-2500}");
        assert_eq!(result.unwrap(), "min_duration_ms: 2500");
    }

    #[test]
    fn env_substitution_default_with_braces() {
        let (result, _) = substitute("overlay: ${MOVING_WINDOW_TEST_UNSET_A2:-{width: 9}}");
        assert_eq!(result.unwrap(), "overlay: {width: 9}");
    }

    #[test]
    fn env_substitution_required_missing() {
        let (result, _) = substitute("font: ${MOVING_WINDOW_TEST_UNSET_B1:?font must be set}");
        match result {
            Err(ConfigError::EnvVarNotSet { var, location }) => {
                assert_eq!(var, "MOVING_WINDOW_TEST_UNSET_B1");
                assert_eq!(location, "font must be set");
            }
            other => panic!("expected EnvVarNotSet, got {other:?}"),
        }
    }

    #[test]
    fn env_substitution_missing_warns() {
        let (result, warnings) = substitute("font: ${MOVING_WINDOW_TEST_UNSET_C1}");
        assert_eq!(result.unwrap(), "font: ");
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("MOVING_WINDOW_TEST_UNSET_C1"));
    }

    #[test]
    fn env_substitution_escaped_dollar() {
        let (result, _) = substitute("font: $$mono");
        assert_eq!(result.unwrap(), "font: $mono");
    }

    #[test]
    fn env_substitution_unclosed_reference() {
        let (result, _) = substitute("font: ${UNCLOSED");
        assert!(matches!(result, Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn load_str_resolves_and_warns() {
        let loader = ConfigLoader::new(ConfigLimits {
            max_config_size: 1024,
        });
        let loaded = loader
            .load_str(
                "profile: experiment\nmin_duration_ms: 400\n",
                Path::new("inline.yaml"),
            )
            .unwrap();
        assert!((loaded.params.min_duration_ms - 400.0).abs() < f64::EPSILON);
        assert_eq!(loaded.params.font, "Courier New");
        assert_eq!(loaded.warnings.len(), 1);
        assert_eq!(loaded.warnings[0].location.as_deref(), Some("min_duration_ms"));
    }

    #[test]
    fn load_str_rejects_invalid_values() {
        let loader = ConfigLoader::with_defaults();
        let err = loader
            .load_str("font_size: -4\nline_height: 0\n", Path::new("bad.yaml"))
            .unwrap_err();
        match err {
            ConfigError::ValidationError { errors, .. } => assert_eq!(errors.len(), 2),
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn load_str_rejects_empty_input() {
        let err = ConfigLoader::with_defaults()
            .load_str("", Path::new("empty.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn load_str_reports_unknown_fields() {
        let err = ConfigLoader::with_defaults()
            .load_str("fontsize: 12\n", Path::new("typo.yaml"))
            .unwrap_err();
        assert!(err.to_string().contains("typo.yaml"));
    }

    #[test]
    fn size_limit_is_enforced() {
        let loader = ConfigLoader::new(ConfigLimits { max_config_size: 8 });
        let err = loader
            .load_str("profile: experiment\n", Path::new("big.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::TooLarge { limit: 8, .. }));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "profile: experiment\nwidth: 640").unwrap();
        let loaded = ConfigLoader::with_defaults().load(file.path()).unwrap();
        assert!((loaded.params.width - 640.0).abs() < f64::EPSILON);
        assert!(loaded.warnings.is_empty());
    }

    #[test]
    fn load_missing_file() {
        let err = ConfigLoader::with_defaults()
            .load(Path::new("/nonexistent/trial.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn limits_default() {
        let limits = ConfigLimits::default();
        assert!(limits.max_config_size > 0);
    }
}
