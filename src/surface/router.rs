//! Pointer routing for the headless surface.
//!
//! Turns raw pointer positions into the enter/leave/move inputs a browser
//! would dispatch: leaves first (innermost region first), then enters
//! (outermost first), then the move itself. Only inputs someone has
//! subscribed to are produced.

use std::collections::BTreeSet;

use super::headless::HeadlessSurface;
use crate::trial::surface::{HostInput, RegionId, Subscription};

/// Tracks which regions the pointer is currently inside.
#[derive(Debug, Default)]
pub struct PointerRouter {
    hovered: BTreeSet<RegionId>,
}

impl PointerRouter {
    /// Creates a router with the pointer outside every region.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Regions the pointer is inside, outermost first.
    pub fn hovered(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.hovered.iter().copied()
    }

    /// Moves the pointer to `(x, y)` and returns the inputs to deliver.
    pub fn pointer_to(&mut self, surface: &HeadlessSurface, x: f64, y: f64) -> Vec<HostInput> {
        let now: BTreeSet<RegionId> = surface.hit_test(x, y).into_iter().collect();
        let mut inputs = self.transition(surface, now);
        if surface.is_subscribed(Subscription::PointerMove) {
            inputs.push(HostInput::PointerMove { x, y });
        }
        inputs
    }

    /// Moves the pointer off every region (e.g. out of the window).
    pub fn pointer_out(&mut self, surface: &HeadlessSurface) -> Vec<HostInput> {
        self.transition(surface, BTreeSet::new())
    }

    fn transition(&mut self, surface: &HeadlessSurface, now: BTreeSet<RegionId>) -> Vec<HostInput> {
        let left: Vec<RegionId> = self.hovered.difference(&now).copied().collect();
        let leaves = left
            .into_iter()
            .rev()
            .filter(|&r| surface.is_subscribed(Subscription::PointerLeave(r)))
            .map(HostInput::PointerLeave);
        let enters = now
            .difference(&self.hovered)
            .copied()
            .filter(|&r| surface.is_subscribed(Subscription::PointerEnter(r)))
            .map(HostInput::PointerEnter);
        let inputs = leaves.chain(enters).collect();
        self.hovered = now;
        inputs
    }
}
