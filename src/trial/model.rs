//! Trial data model: parameters, logged events, geometry, and the result
//! handed back to the caller.

use serde::{Deserialize, Serialize};

use crate::error::TrialError;

// ============================================================================
// Parameters
// ============================================================================

/// Default fixation-marker hide delay after fixation is triggered.
pub const DEFAULT_FIXATION_HIDE_MS: u64 = 200;

/// Default reveal delay after fixation is triggered.
pub const DEFAULT_REVEAL_MS: u64 = 1000;

/// Size and pointer offset of the pointer-following overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayParams {
    /// Overlay width in pixels.
    pub width: f64,
    /// Overlay height in pixels.
    pub height: f64,
    /// Horizontal offset from the pointer (may be negative).
    pub offset_x: f64,
    /// Vertical offset from the pointer (may be negative).
    pub offset_y: f64,
}

impl Default for OverlayParams {
    fn default() -> Self {
        Self {
            width: 50.0,
            height: 50.0,
            offset_x: 12.0,
            offset_y: -6.0,
        }
    }
}

/// Fixed delays scheduled when the fixation marker is entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingParams {
    /// Delay before the fixation marker disappears. Decorative only.
    pub fixation_hide_ms: u64,
    /// Delay before the text becomes visible.
    pub reveal_ms: u64,
}

impl Default for TimingParams {
    fn default() -> Self {
        Self {
            fixation_hide_ms: DEFAULT_FIXATION_HIDE_MS,
            reveal_ms: DEFAULT_REVEAL_MS,
        }
    }
}

/// Visual and timing parameters for one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialParams {
    /// Font family name.
    pub font: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Line height in pixels.
    pub line_height: f64,
    /// Render width in pixels; `0` lets the text take its natural width.
    pub width: f64,
    /// Minimum time from render before continue has an effect.
    pub min_duration_ms: f64,
    /// Pointer-following overlay.
    pub overlay: OverlayParams,
    /// Fixation-triggered delays.
    pub timing: TimingParams,
}

impl Default for TrialParams {
    fn default() -> Self {
        Self {
            font: "Arial".to_owned(),
            font_size: 18.0,
            line_height: 40.0,
            width: 0.0,
            min_duration_ms: 1000.0,
            overlay: OverlayParams::default(),
            timing: TimingParams::default(),
        }
    }
}

impl TrialParams {
    /// Settings used by the reference passive/active reading experiment:
    /// monospace text on an 800px column, a 3s minimum, and a wide overlay.
    #[must_use]
    pub fn experiment_profile() -> Self {
        Self {
            font: "Courier New".to_owned(),
            font_size: 18.0,
            line_height: 180.0,
            width: 800.0,
            min_duration_ms: 3000.0,
            overlay: OverlayParams {
                width: 102.0,
                height: 38.0,
                ..OverlayParams::default()
            },
            timing: TimingParams::default(),
        }
    }

    /// Checks that every numeric parameter is usable for layout and timing.
    ///
    /// # Errors
    ///
    /// Returns [`TrialError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<(), TrialError> {
        positive("font_size", self.font_size)?;
        positive("line_height", self.line_height)?;
        non_negative("width", self.width)?;
        non_negative("min_duration_ms", self.min_duration_ms)?;
        non_negative("overlay.width", self.overlay.width)?;
        non_negative("overlay.height", self.overlay.height)?;
        finite("overlay.offset_x", self.overlay.offset_x)?;
        finite("overlay.offset_y", self.overlay.offset_y)?;
        Ok(())
    }
}

fn finite(name: &'static str, value: f64) -> Result<(), TrialError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TrialError::InvalidParameter {
            name,
            reason: format!("must be finite, got {value}"),
        })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), TrialError> {
    finite(name, value)?;
    if value < 0.0 {
        return Err(TrialError::InvalidParameter {
            name,
            reason: format!("must not be negative, got {value}"),
        });
    }
    Ok(())
}

fn positive(name: &'static str, value: f64) -> Result<(), TrialError> {
    finite(name, value)?;
    if value <= 0.0 {
        return Err(TrialError::InvalidParameter {
            name,
            reason: format!("must be positive, got {value}"),
        });
    }
    Ok(())
}

// ============================================================================
// Reveal state
// ============================================================================

/// Visibility sub-state of a trial.
///
/// `Hidden` is waiting for fixation, `Unlocked` is the interval between
/// fixation and the reveal timer, and `Visible` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealState {
    /// Waiting for the pointer to enter the fixation marker.
    #[default]
    Hidden,
    /// Fixation triggered; reveal timer pending.
    Unlocked,
    /// Text legible; the visibility gate is open.
    Visible,
}

// ============================================================================
// Logged data
// ============================================================================

/// Direction of a pointer-occupancy transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    /// Pointer entered a word region.
    Enter,
    /// Pointer left a word region.
    Leave,
}

/// A timestamped enter/leave on one word region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordEvent {
    /// Word index.
    pub index: usize,
    /// Word text.
    pub text: String,
    /// Enter or leave.
    pub kind: EventKind,
    /// Milliseconds since render completed.
    pub elapsed_ms: f64,
}

/// Axis-aligned rectangle in the caller's viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if the point lies inside the rectangle. The right and
    /// bottom edges are exclusive so adjacent regions never overlap.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    /// Returns the center point.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Returns the smallest rectangle covering both.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let left = self.x.min(other.x);
        let top = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Self::new(left, top, right - left, bottom - top)
    }
}

/// Laid-out rectangle of one word region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordGeometry {
    /// Word index.
    pub index: usize,
    /// Word text.
    pub text: String,
    /// Bounding rectangle.
    pub rect: Rect,
}

/// Append-only log of word events.
///
/// Only [`push`](Self::push) mutates; entries are never edited or removed.
#[derive(Debug, Default)]
pub struct EventLog {
    events: Vec<WordEvent>,
}

impl EventLog {
    /// Creates an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Appends an event.
    pub fn push(&mut self, event: WordEvent) {
        self.events.push(event);
    }

    /// Returns the events recorded so far.
    #[must_use]
    pub fn as_slice(&self) -> &[WordEvent] {
        &self.events
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    fn into_vec(self) -> Vec<WordEvent> {
        self.events
    }
}

/// Outcome of a completed trial.
///
/// Serializes as `{"wordEvents": [...], "wordGeometry": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialResult {
    word_events: Vec<WordEvent>,
    word_geometry: Vec<WordGeometry>,
}

impl TrialResult {
    pub(crate) fn new(log: EventLog, word_geometry: Vec<WordGeometry>) -> Self {
        Self {
            word_events: log.into_vec(),
            word_geometry,
        }
    }

    /// Word events in emission order.
    #[must_use]
    pub fn word_events(&self) -> &[WordEvent] {
        &self.word_events
    }

    /// One geometry entry per word, in word order.
    #[must_use]
    pub fn word_geometry(&self) -> &[WordGeometry] {
        &self.word_geometry
    }
}
