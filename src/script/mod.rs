//! Replay scripts.
//!
//! A script is a YAML timeline of pointer actions and continue presses
//! applied to one sentence:
//!
//! ```yaml
//! sentence: "The cat sat."
//! steps:
//!   - { at_ms: 0, action: hover_fixation }
//!   - { at_ms: 1200, action: hover_word, index: 0 }
//!   - { at_ms: 1400, action: hover_outside }
//!   - { at_ms: 3500, action: continue }
//! ```
//!
//! [`replay`] runs the timeline against a [`HeadlessSurface`] with a manual
//! clock, so the resulting timestamps are exact and repeatable.
//!
//! [`HeadlessSurface`]: crate::surface::HeadlessSurface

mod replay;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ScriptError;
use crate::surface::Viewport;

pub use replay::{ReplayReport, replay};

/// A scripted trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Sentence to present.
    pub sentence: String,
    /// Viewport the text is laid out in.
    #[serde(default)]
    pub viewport: Viewport,
    /// Timeline, in non-decreasing `at_ms` order.
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One timed action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Step {
    /// Milliseconds after render at which the action happens.
    pub at_ms: f64,
    /// What happens.
    #[serde(flatten)]
    pub action: Action,
}

/// Scripted participant action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Move the pointer onto the fixation marker's center.
    HoverFixation,
    /// Move the pointer onto a word's center.
    HoverWord {
        /// Word index.
        index: usize,
    },
    /// Move the pointer off the text entirely.
    HoverOutside,
    /// Move the pointer to viewport coordinates.
    Move {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
    },
    /// Press continue.
    Continue,
}

impl Script {
    /// Parses a script from YAML.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::Parse`] for malformed YAML, or a timeline
    /// error if step timestamps are invalid or out of order.
    pub fn from_yaml(yaml: &str) -> Result<Self, ScriptError> {
        let script: Self = serde_yaml::from_str(yaml)?;
        script.check_timeline()?;
        Ok(script)
    }

    /// Reads and parses a script file.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read, otherwise as
    /// [`from_yaml`](Self::from_yaml).
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let yaml = std::fs::read_to_string(path)?;
        Ok(Self::from_yaml(&yaml)?)
    }

    /// Checks that timestamps are finite, non-negative, and non-decreasing.
    ///
    /// # Errors
    ///
    /// Returns [`ScriptError::InvalidTimestamp`] or [`ScriptError::OutOfOrder`]
    /// for the first offending step.
    pub fn check_timeline(&self) -> Result<(), ScriptError> {
        let mut previous_ms = 0.0_f64;
        for (index, step) in self.steps.iter().enumerate() {
            if !step.at_ms.is_finite() || step.at_ms < 0.0 {
                return Err(ScriptError::InvalidTimestamp {
                    index,
                    at_ms: step.at_ms,
                });
            }
            if step.at_ms < previous_ms {
                return Err(ScriptError::OutOfOrder {
                    index,
                    at_ms: step.at_ms,
                    previous_ms,
                });
            }
            previous_ms = step.at_ms;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_actions() {
        let script = Script::from_yaml(
            r#"
sentence: "The cat sat."
viewport: { width: 800, height: 600 }
steps:
  - { at_ms: 0, action: hover_fixation }
  - { at_ms: 1200, action: hover_word, index: 2 }
  - { at_ms: 1300, action: move, x: 5, y: 6.5 }
  - { at_ms: 1400, action: hover_outside }
  - { at_ms: 1400, action: continue }
"#,
        )
        .unwrap();

        assert!((script.viewport.width - 800.0).abs() < f64::EPSILON);
        assert_eq!(script.steps.len(), 5);
        assert_eq!(script.steps[1].action, Action::HoverWord { index: 2 });
        assert_eq!(script.steps[2].action, Action::Move { x: 5.0, y: 6.5 });
        assert_eq!(script.steps[4].action, Action::Continue);
    }

    #[test]
    fn viewport_and_steps_are_optional() {
        let script = Script::from_yaml("sentence: hello").unwrap();
        assert_eq!(script.viewport, Viewport::default());
        assert!(script.steps.is_empty());
    }

    #[test]
    fn rejects_out_of_order_steps() {
        let err = Script::from_yaml(
            r"
sentence: a b
steps:
  - { at_ms: 500, action: continue }
  - { at_ms: 400, action: continue }
",
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::OutOfOrder { index: 1, .. }));
    }

    #[test]
    fn rejects_negative_timestamp() {
        let err = Script::from_yaml(
            r"
sentence: a b
steps:
  - { at_ms: -1, action: continue }
",
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::InvalidTimestamp { index: 0, .. }));
    }

    #[test]
    fn rejects_unknown_action() {
        let err = Script::from_yaml(
            r"
sentence: a b
steps:
  - { at_ms: 0, action: click }
",
        )
        .unwrap_err();
        assert!(matches!(err, ScriptError::Parse(_)));
    }
}
