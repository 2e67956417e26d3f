//! Renderer capability consumed by the trial controller.
//!
//! The controller never touches a concrete UI toolkit. It asks a
//! [`Surface`] to create regions, toggle their visibility, move the
//! overlay, report laid-out rectangles, and register the pointer
//! subscriptions it wants delivered. The host then feeds matching
//! [`HostInput`]s back into the controller.

use super::model::Rect;
use super::sentence::Word;

/// Opaque handle to a region created on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RegionId(pub u32);

/// Handle returned by [`Surface::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Font settings applied to a text region.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    /// Font family name.
    pub font: String,
    /// Font size in pixels.
    pub font_size: f64,
    /// Line height in pixels.
    pub line_height: f64,
    /// Render width in pixels (`0` for natural width).
    pub width: f64,
}

/// A pointer observation the controller asks the host to deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subscription {
    /// Pointer entered the region.
    PointerEnter(RegionId),
    /// Pointer left the region.
    PointerLeave(RegionId),
    /// Any pointer movement anywhere on the page.
    PointerMove,
}

/// Pointer input delivered by the host's event dispatch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostInput {
    /// Pointer entered a region.
    PointerEnter(RegionId),
    /// Pointer left a region.
    PointerLeave(RegionId),
    /// Pointer moved to viewport coordinates.
    PointerMove {
        /// Horizontal position.
        x: f64,
        /// Vertical position.
        y: f64,
    },
}

/// Presentation backend for one trial.
pub trait Surface {
    /// Creates the fixation glyph, horizontally shifted by `shift_x`.
    fn create_fixation(&mut self, glyph: &str, style: &TextStyle, shift_x: f64) -> RegionId;

    /// Creates the continuous-text layer; it starts obscured.
    fn create_upper_layer(&mut self, text: &str, style: &TextStyle) -> RegionId;

    /// Creates the empty container that will hold word regions.
    fn create_lower_layer(&mut self, style: &TextStyle) -> RegionId;

    /// Appends a word region to the lower layer.
    fn append_word(&mut self, lower: RegionId, word: &Word) -> RegionId;

    /// Appends literal spacing after a word.
    fn append_spacing(&mut self, lower: RegionId, spacing: &str);

    /// Creates the pointer-follow overlay; it starts hidden.
    fn create_overlay(&mut self, width: f64, height: f64) -> RegionId;

    /// Shows or hides a region.
    fn set_visible(&mut self, region: RegionId, visible: bool);

    /// Obscures (e.g. blurs) or clears a text layer.
    fn set_obscured(&mut self, region: RegionId, obscured: bool);

    /// Moves a region's top-left corner.
    fn move_to(&mut self, region: RegionId, x: f64, y: f64);

    /// Returns the region's current laid-out rectangle.
    fn bounding_rect(&self, region: RegionId) -> Rect;

    /// Registers a pointer observation.
    fn subscribe(&mut self, subscription: Subscription) -> SubscriptionId;

    /// Removes a pointer observation. Unknown ids are ignored.
    fn unsubscribe(&mut self, id: SubscriptionId);
}
