//! Trial configuration schema.
//!
//! Every field is optional. Unset fields fall back to the selected
//! `profile`: `plugin` (the reading plugin's own defaults) or
//! `experiment` (the reference experiment's settings).
//!
//! ```yaml
//! profile: experiment
//! min_duration_ms: 2500
//! overlay:
//!   width: 120
//! timing:
//!   reveal_ms: 800
//! ```

use serde::{Deserialize, Serialize};

use crate::trial::model::TrialParams;

/// Base set of defaults a config is layered over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Profile {
    /// Arial 18px, natural width, 1s minimum, 50×50 overlay.
    #[default]
    Plugin,
    /// Courier New 18px on an 800px column, 3s minimum, 102×38 overlay.
    Experiment,
}

impl Profile {
    /// Parameters this profile starts from.
    #[must_use]
    pub fn params(self) -> TrialParams {
        match self {
            Self::Plugin => TrialParams::default(),
            Self::Experiment => TrialParams::experiment_profile(),
        }
    }
}

/// Top-level trial configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TrialConfig {
    /// Defaults to layer the remaining fields over.
    #[serde(default)]
    pub profile: Profile,

    /// Font family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font: Option<String>,

    /// Font size in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f64>,

    /// Line height in pixels.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_height: Option<f64>,

    /// Render width in pixels; `0` means natural width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,

    /// Minimum time before continue has an effect.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_duration_ms: Option<f64>,

    /// Pointer-following overlay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<OverlayConfig>,

    /// Fixation-triggered delays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing: Option<TimingConfig>,
}

/// Overlay section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverlayConfig {
    /// Overlay width.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    /// Overlay height.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    /// Horizontal pointer offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_x: Option<f64>,
    /// Vertical pointer offset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset_y: Option<f64>,
}

/// Timing section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimingConfig {
    /// Delay before the fixation marker is hidden.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fixation_hide_ms: Option<u64>,
    /// Delay before the text is revealed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reveal_ms: Option<u64>,
}

impl TrialConfig {
    /// Resolves the config against its profile.
    ///
    /// The result is not validated; see
    /// [`Validator`](crate::config::Validator).
    #[must_use]
    pub fn to_params(&self) -> TrialParams {
        let mut params = self.profile.params();

        if let Some(font) = &self.font {
            params.font.clone_from(font);
        }
        apply(&mut params.font_size, self.font_size);
        apply(&mut params.line_height, self.line_height);
        apply(&mut params.width, self.width);
        apply(&mut params.min_duration_ms, self.min_duration_ms);

        if let Some(overlay) = &self.overlay {
            apply(&mut params.overlay.width, overlay.width);
            apply(&mut params.overlay.height, overlay.height);
            apply(&mut params.overlay.offset_x, overlay.offset_x);
            apply(&mut params.overlay.offset_y, overlay.offset_y);
        }
        if let Some(timing) = &self.timing {
            apply(&mut params.timing.fixation_hide_ms, timing.fixation_hide_ms);
            apply(&mut params.timing.reveal_ms, timing.reveal_ms);
        }

        params
    }
}

fn apply<T>(slot: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *slot = value;
    }
}
