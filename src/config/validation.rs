//! Trial configuration validation.
//!
//! Runs on the deserialized [`TrialConfig`] after it has been resolved
//! against its profile. Collects every problem instead of stopping at the
//! first so one run of `trial validate` reports everything.

use crate::config::schema::TrialConfig;
use crate::error::{Severity, ValidationIssue};
use crate::trial::model::TrialParams;

/// Outcome of validating one config.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Problems that make the config unusable.
    pub errors: Vec<ValidationIssue>,

    /// Suspicious settings that still produce a working trial.
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Collecting validator for [`TrialConfig`].
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a configuration and returns every issue found.
    pub fn validate(&mut self, config: &TrialConfig) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        let params = config.to_params();
        self.validate_text(&params);
        self.validate_overlay(&params);
        self.validate_timing(config, &params);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    fn validate_text(&mut self, params: &TrialParams) {
        if params.font.trim().is_empty() {
            self.add_error("font", "font family cannot be empty");
        }
        self.positive("font_size", params.font_size);
        self.positive("line_height", params.line_height);
        self.non_negative("width", params.width);

        if params.width.abs() < f64::EPSILON {
            self.add_warning(
                "width",
                "width is 0; text is laid out at its natural width without wrapping",
            );
        }
        if params.width.is_finite() && params.width > 0.0 && params.width < params.font_size {
            self.add_warning("width", "width is narrower than a single glyph");
        }
    }

    fn validate_overlay(&mut self, params: &TrialParams) {
        let overlay = &params.overlay;
        self.non_negative("overlay.width", overlay.width);
        self.non_negative("overlay.height", overlay.height);
        self.finite("overlay.offset_x", overlay.offset_x);
        self.finite("overlay.offset_y", overlay.offset_y);

        if overlay.width.abs() < f64::EPSILON || overlay.height.abs() < f64::EPSILON {
            self.add_warning("overlay", "overlay has zero area and will never be seen");
        }
    }

    fn validate_timing(&mut self, config: &TrialConfig, params: &TrialParams) {
        self.non_negative("min_duration_ms", params.min_duration_ms);

        let timing = params.timing;
        #[allow(clippy::cast_precision_loss)]
        let reveal_ms = timing.reveal_ms as f64;
        if params.min_duration_ms.is_finite() && params.min_duration_ms < reveal_ms {
            self.add_warning(
                "min_duration_ms",
                "minimum duration is shorter than the reveal delay, so only the visibility gate applies",
            );
        }
        if timing.fixation_hide_ms > timing.reveal_ms {
            let path = if config.timing.is_some() {
                "timing.fixation_hide_ms"
            } else {
                "timing"
            };
            self.add_warning(path, "fixation marker stays visible after the text is revealed");
        }
    }

    fn finite(&mut self, path: &str, value: f64) -> bool {
        if value.is_finite() {
            true
        } else {
            self.add_error(path, &format!("must be a finite number, got {value}"));
            false
        }
    }

    fn non_negative(&mut self, path: &str, value: f64) {
        if self.finite(path, value) && value < 0.0 {
            self.add_error(path, &format!("must not be negative, got {value}"));
        }
    }

    fn positive(&mut self, path: &str, value: f64) {
        if self.finite(path, value) && value <= 0.0 {
            self.add_error(path, &format!("must be greater than 0, got {value}"));
        }
    }

    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{OverlayConfig, Profile, TimingConfig};

    fn validate(config: &TrialConfig) -> ValidationResult {
        Validator::new().validate(config)
    }

    fn paths(issues: &[ValidationIssue]) -> Vec<&str> {
        issues.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn experiment_profile_is_clean() {
        let config = TrialConfig {
            profile: Profile::Experiment,
            ..TrialConfig::default()
        };
        let result = validate(&config);
        assert!(result.is_valid());
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn plugin_defaults_warn_about_natural_width() {
        let result = validate(&TrialConfig::default());
        assert!(result.is_valid());
        assert_eq!(paths(&result.warnings), ["width"]);
    }

    #[test]
    fn collects_all_errors() {
        let config = TrialConfig {
            profile: Profile::Experiment,
            font: Some("  ".to_owned()),
            font_size: Some(0.0),
            line_height: Some(-3.0),
            overlay: Some(OverlayConfig {
                width: Some(-1.0),
                ..OverlayConfig::default()
            }),
            ..TrialConfig::default()
        };
        let result = validate(&config);
        assert!(result.has_errors());
        assert_eq!(
            paths(&result.errors),
            ["font", "font_size", "line_height", "overlay.width"]
        );
    }

    #[test]
    fn short_minimum_duration_warns() {
        let config = TrialConfig {
            profile: Profile::Experiment,
            min_duration_ms: Some(500.0),
            ..TrialConfig::default()
        };
        let result = validate(&config);
        assert!(result.is_valid());
        assert_eq!(paths(&result.warnings), ["min_duration_ms"]);
    }

    #[test]
    fn late_fixation_hide_warns() {
        let config = TrialConfig {
            profile: Profile::Experiment,
            timing: Some(TimingConfig {
                fixation_hide_ms: Some(1500),
                reveal_ms: None,
            }),
            ..TrialConfig::default()
        };
        let result = validate(&config);
        assert_eq!(paths(&result.warnings), ["timing.fixation_hide_ms"]);
    }

    #[test]
    fn zero_area_overlay_warns() {
        let config = TrialConfig {
            profile: Profile::Experiment,
            overlay: Some(OverlayConfig {
                height: Some(0.0),
                ..OverlayConfig::default()
            }),
            ..TrialConfig::default()
        };
        let result = validate(&config);
        assert!(result.is_valid());
        assert_eq!(paths(&result.warnings), ["overlay"]);
    }

    #[test]
    fn validator_is_reusable() {
        let mut validator = Validator::new();
        let bad = TrialConfig {
            font_size: Some(-1.0),
            ..TrialConfig::default()
        };
        assert!(validator.validate(&bad).has_errors());
        let good = TrialConfig {
            profile: Profile::Experiment,
            ..TrialConfig::default()
        };
        assert!(validator.validate(&good).is_valid());
    }
}
