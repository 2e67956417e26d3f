//! In-memory surface with deterministic monospace layout.
//!
//! Every glyph advances by `0.6 × font_size`. Words wrap when a fixed
//! render width is set; with width `0` the text stays on one line. The
//! text block is centered horizontally in the viewport with its first
//! line on the vertical midline.
//!
//! The surface also records which pointer subscriptions are live, so
//! tests and scripted runs can check that a disposed trial left nothing
//! behind.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::trial::model::Rect;
use crate::trial::sentence::Word;
use crate::trial::surface::{RegionId, Subscription, SubscriptionId, Surface, TextStyle};

/// Horizontal advance of one glyph relative to the font size.
pub const GLYPH_ADVANCE: f64 = 0.6;

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Viewport width.
    pub width: f64,
    /// Viewport height.
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Fixation,
    Upper,
    Lower,
    Word(usize),
    Overlay,
}

#[derive(Debug, Clone)]
struct Region {
    role: Role,
    /// Block-relative for text regions, absolute for the overlay.
    rect: Rect,
    visible: bool,
    obscured: bool,
}

/// Headless [`Surface`] implementation.
#[derive(Debug, Default)]
pub struct HeadlessSurface {
    viewport: Viewport,
    style: Option<TextStyle>,
    regions: Vec<Region>,
    words: Vec<RegionId>,
    listeners: BTreeMap<u64, Subscription>,
    next_listener: u64,
    pen_x: f64,
    line: usize,
    natural_width: f64,
}

impl HeadlessSurface {
    /// Creates an empty surface for the given viewport.
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            ..Self::default()
        }
    }

    /// The viewport size.
    #[must_use]
    pub const fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Number of word regions appended.
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Region of word `index`.
    #[must_use]
    pub fn word_region(&self, index: usize) -> Option<RegionId> {
        self.words.get(index).copied()
    }

    /// Absolute rectangle of word `index`.
    #[must_use]
    pub fn word_rect(&self, index: usize) -> Option<Rect> {
        self.word_region(index).map(|r| self.bounding_rect(r))
    }

    /// Region of the fixation marker.
    #[must_use]
    pub fn fixation_region(&self) -> Option<RegionId> {
        self.find(Role::Fixation)
    }

    /// Region of the continuous-text layer.
    #[must_use]
    pub fn upper_region(&self) -> Option<RegionId> {
        self.find(Role::Upper)
    }

    /// Region of the word container.
    #[must_use]
    pub fn lower_region(&self) -> Option<RegionId> {
        self.find(Role::Lower)
    }

    /// Region of the overlay.
    #[must_use]
    pub fn overlay_region(&self) -> Option<RegionId> {
        self.find(Role::Overlay)
    }

    /// Whether the region is shown. Unknown regions report `false`.
    #[must_use]
    pub fn is_visible(&self, region: RegionId) -> bool {
        self.region(region).is_some_and(|r| r.visible)
    }

    /// Whether the region is obscured. Unknown regions report `false`.
    #[must_use]
    pub fn is_obscured(&self, region: RegionId) -> bool {
        self.region(region).is_some_and(|r| r.obscured)
    }

    /// Number of live subscriptions of any kind.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Number of live pointer-move subscriptions.
    #[must_use]
    pub fn move_listener_count(&self) -> usize {
        self.listeners
            .values()
            .filter(|s| matches!(s, Subscription::PointerMove))
            .count()
    }

    /// Whether anyone currently observes `subscription`.
    #[must_use]
    pub fn is_subscribed(&self, subscription: Subscription) -> bool {
        self.listeners.values().any(|s| *s == subscription)
    }

    /// Hoverable regions under the point, parents before children.
    ///
    /// Hidden regions and the overlay never receive pointer input. A shown
    /// fixation marker sits on top of the text and occludes it.
    #[must_use]
    pub fn hit_test(&self, x: f64, y: f64) -> Vec<RegionId> {
        if let Some(fixation) = self.fixation_region() {
            if self.is_visible(fixation) && self.bounding_rect(fixation).contains(x, y) {
                return vec![fixation];
            }
        }
        self.regions
            .iter()
            .enumerate()
            .filter(|(_, r)| r.visible && matches!(r.role, Role::Lower | Role::Word(_)))
            .map(|(i, _)| region_id(i))
            .filter(|&id| self.bounding_rect(id).contains(x, y))
            .collect()
    }

    fn find(&self, role: Role) -> Option<RegionId> {
        self.regions
            .iter()
            .position(|r| r.role == role)
            .map(region_id)
    }

    fn region(&self, region: RegionId) -> Option<&Region> {
        self.regions.get(region.0 as usize)
    }

    fn region_mut(&mut self, region: RegionId) -> Option<&mut Region> {
        self.regions.get_mut(region.0 as usize)
    }

    fn push(&mut self, role: Role, rect: Rect) -> RegionId {
        let id = region_id(self.regions.len());
        self.regions.push(Region {
            role,
            rect,
            visible: true,
            obscured: false,
        });
        id
    }

    fn advance(&self) -> f64 {
        self.style
            .as_ref()
            .map_or(0.0, |s| s.font_size * GLYPH_ADVANCE)
    }

    fn line_height(&self) -> f64 {
        self.style.as_ref().map_or(0.0, |s| s.line_height)
    }

    fn block_width(&self) -> f64 {
        match &self.style {
            Some(style) if style.width > 0.0 => style.width,
            _ => self.natural_width,
        }
    }

    /// Absolute top-left corner of the text block.
    fn block_origin(&self) -> (f64, f64) {
        let left = (self.viewport.width - self.block_width()) / 2.0;
        let top = self.viewport.height / 2.0;
        (left, top)
    }

    fn text_extent(&self) -> Rect {
        let lines = if self.words.is_empty() { 1 } else { self.line + 1 };
        #[allow(clippy::cast_precision_loss)]
        let height = self.line_height() * lines as f64;
        Rect::new(0.0, 0.0, self.block_width(), height)
    }
}

fn region_id(index: usize) -> RegionId {
    RegionId(u32::try_from(index).unwrap_or(u32::MAX))
}

#[allow(clippy::cast_precision_loss)]
fn glyphs(text: &str) -> f64 {
    text.chars().count() as f64
}

impl Surface for HeadlessSurface {
    fn create_fixation(&mut self, glyph: &str, style: &TextStyle, shift_x: f64) -> RegionId {
        let width = glyphs(glyph) * style.font_size * GLYPH_ADVANCE;
        // Stored relative to the block center; resolved in bounding_rect.
        let rect = Rect::new(shift_x - width / 2.0, 0.0, width, style.line_height);
        self.push(Role::Fixation, rect)
    }

    fn create_upper_layer(&mut self, _text: &str, style: &TextStyle) -> RegionId {
        if self.style.is_none() {
            self.style = Some(style.clone());
        }
        self.push(Role::Upper, Rect::default())
    }

    fn create_lower_layer(&mut self, style: &TextStyle) -> RegionId {
        self.style = Some(style.clone());
        self.pen_x = 0.0;
        self.line = 0;
        self.natural_width = 0.0;
        self.push(Role::Lower, Rect::default())
    }

    fn append_word(&mut self, _lower: RegionId, word: &Word) -> RegionId {
        let advance = self.advance();
        let width = glyphs(&word.text) * advance;
        let wraps = self
            .style
            .as_ref()
            .is_some_and(|s| s.width > 0.0 && self.pen_x > 0.0 && self.pen_x + width > s.width);
        if wraps {
            self.line += 1;
            self.pen_x = 0.0;
        }

        #[allow(clippy::cast_precision_loss)]
        let y = self.line as f64 * self.line_height();
        let rect = Rect::new(self.pen_x, y, width, self.line_height());
        self.pen_x += width;
        self.natural_width = self.natural_width.max(self.pen_x);

        let id = self.push(Role::Word(word.index), rect);
        self.words.push(id);
        id
    }

    fn append_spacing(&mut self, _lower: RegionId, spacing: &str) {
        self.pen_x += glyphs(spacing) * self.advance();
    }

    fn create_overlay(&mut self, width: f64, height: f64) -> RegionId {
        self.push(Role::Overlay, Rect::new(0.0, 0.0, width, height))
    }

    fn set_visible(&mut self, region: RegionId, visible: bool) {
        if let Some(r) = self.region_mut(region) {
            r.visible = visible;
        }
    }

    fn set_obscured(&mut self, region: RegionId, obscured: bool) {
        if let Some(r) = self.region_mut(region) {
            r.obscured = obscured;
        }
    }

    fn move_to(&mut self, region: RegionId, x: f64, y: f64) {
        if let Some(r) = self.region_mut(region) {
            r.rect.x = x;
            r.rect.y = y;
        }
    }

    fn bounding_rect(&self, region: RegionId) -> Rect {
        let Some(r) = self.region(region) else {
            return Rect::default();
        };
        let (left, top) = self.block_origin();
        match r.role {
            Role::Overlay => r.rect,
            Role::Upper | Role::Lower => {
                let extent = self.text_extent();
                Rect::new(left, top, extent.width, extent.height)
            }
            Role::Word(_) => Rect::new(left + r.rect.x, top + r.rect.y, r.rect.width, r.rect.height),
            Role::Fixation => {
                let center = left + self.block_width() / 2.0;
                Rect::new(center + r.rect.x, top + r.rect.y, r.rect.width, r.rect.height)
            }
        }
    }

    fn subscribe(&mut self, subscription: Subscription) -> SubscriptionId {
        let id = self.next_listener;
        self.next_listener += 1;
        self.listeners.insert(id, subscription);
        SubscriptionId(id)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.remove(&id.0);
    }
}
