//! Stimulus lists.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::Categorized;

/// One item of a stimulus list.
///
/// ```yaml
/// - id: 7
///   item_type: PASSIVE
///   stimulus: The letter was written by the nurse.
///   question: Did the nurse write the letter?
///   qanswer: "TRUE"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StimulusItem {
    /// Item identifier.
    pub id: u64,
    /// Condition the run-length constraint applies to.
    pub item_type: String,
    /// Sentence shown in the trial.
    pub stimulus: String,
    /// Optional comprehension question; empty means none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    /// Expected answer to the question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qanswer: Option<String>,
}

impl Categorized for StimulusItem {
    fn category(&self) -> &str {
        &self.item_type
    }
}

/// Reads a YAML list of stimulus items.
///
/// # Errors
///
/// Returns an I/O error if the file cannot be read or a YAML error if it
/// is not a list of items.
pub fn load_stimuli(path: &Path) -> crate::error::Result<Vec<StimulusItem>> {
    let yaml = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&yaml)?)
}
