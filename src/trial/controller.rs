//! Moving-window trial controller.
//!
//! Owns one trial from render to result: lays out word regions on a
//! [`Surface`], unlocks the text after a fixation-triggered delay, logs
//! every word enter/leave with its elapsed time, drives the
//! pointer-follow overlay, and gates the continue action on both the
//! minimum duration and visibility.
//!
//! The controller is single-threaded and never blocks. Pointer input,
//! fired timers, and continue requests are pushed in by the host; the
//! controller reacts synchronously.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, info};

use crate::error::TrialError;
use crate::observability::events::{Event, EventEmitter};

use super::clock::Clock;
use super::model::{
    EventKind, EventLog, RevealState, TrialParams, TrialResult, WordEvent, WordGeometry,
};
use super::scheduler::{FiredTimer, Scheduler, TaskId, TimerKind};
use super::sentence::Sentence;
use super::surface::{HostInput, RegionId, Subscription, SubscriptionId, Surface, TextStyle};

/// Glyph used for the fixation marker.
pub const FIXATION_GLYPH: &str = "+";

/// Where a controller is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// Built but not rendered.
    Constructed,
    /// Rendered; accepting input.
    Active,
    /// Result handed out; no further input is processed.
    Completed,
    /// Torn down by the caller.
    Disposed,
}

/// Why a continue action had no effect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GateRefusal {
    /// The trial has not been activated.
    NotActivated,
    /// Less than the minimum duration has elapsed since render.
    MinimumDuration {
        /// Time since render.
        elapsed_ms: f64,
        /// Configured threshold.
        required_ms: f64,
    },
    /// The reveal timer has not fired yet.
    NotRevealed,
}

impl GateRefusal {
    /// Short machine-readable name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotActivated => "not_activated",
            Self::MinimumDuration { .. } => "minimum_duration",
            Self::NotRevealed => "not_revealed",
        }
    }
}

/// Result of [`TrialController::request_continue`].
#[derive(Debug, Clone, PartialEq)]
pub enum ContinueOutcome {
    /// Both gates held; this is the trial's only result.
    Completed(TrialResult),
    /// A gate was closed; nothing changed.
    Refused(GateRefusal),
    /// The trial already completed or was disposed.
    Finished,
}

/// Regions created during activation.
#[derive(Debug)]
struct Layout {
    fixation: RegionId,
    upper: RegionId,
    lower: RegionId,
    overlay: RegionId,
    words: Vec<RegionId>,
    word_by_region: HashMap<RegionId, usize>,
}

/// What a region means to the controller.
enum Target {
    Fixation,
    TextBody,
    Word(usize),
    Unknown,
}

/// Controller for one moving-window reading trial.
pub struct TrialController<S: Surface, C: Clock, T: Scheduler> {
    sentence: Sentence,
    params: TrialParams,
    surface: S,
    clock: C,
    scheduler: T,
    emitter: Option<Arc<EventEmitter>>,
    lifecycle: Lifecycle,
    reveal: RevealState,
    origin_ms: f64,
    last_elapsed_ms: f64,
    log: EventLog,
    layout: Option<Layout>,
    geometry: Vec<WordGeometry>,
    subscriptions: HashMap<Subscription, SubscriptionId>,
    timers: HashMap<TimerKind, TaskId>,
    overlay_shown: bool,
}

impl<S: Surface, C: Clock, T: Scheduler> TrialController<S, C, T> {
    /// Creates a controller for `text`. Nothing is rendered until
    /// [`activate`](Self::activate).
    ///
    /// # Errors
    ///
    /// Returns [`TrialError::EmptySentence`] if `text` has no words, or
    /// [`TrialError::InvalidParameter`] for unusable parameters.
    pub fn new(
        text: &str,
        params: TrialParams,
        surface: S,
        clock: C,
        scheduler: T,
    ) -> Result<Self, TrialError> {
        let sentence = Sentence::parse(text)?;
        params.validate()?;

        Ok(Self {
            sentence,
            params,
            surface,
            clock,
            scheduler,
            emitter: None,
            lifecycle: Lifecycle::Constructed,
            reveal: RevealState::Hidden,
            origin_ms: 0.0,
            last_elapsed_ms: 0.0,
            log: EventLog::new(),
            layout: None,
            geometry: Vec::new(),
            subscriptions: HashMap::new(),
            timers: HashMap::new(),
            overlay_shown: false,
        })
    }

    /// Attaches a lifecycle event sink.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<EventEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    /// Renders the trial and starts its clock.
    ///
    /// Creates the fixation marker, the obscured upper and lower text
    /// layers, one region per word, and the hidden overlay; registers all
    /// pointer subscriptions; snapshots word geometry; then fixes t=0.
    ///
    /// # Errors
    ///
    /// Returns [`TrialError::AlreadyActivated`] on a second call.
    pub fn activate(&mut self) -> Result<(), TrialError> {
        if self.lifecycle != Lifecycle::Constructed {
            return Err(TrialError::AlreadyActivated);
        }

        let style = TextStyle {
            font: self.params.font.clone(),
            font_size: self.params.font_size,
            line_height: self.params.line_height,
            width: self.params.width,
        };
        let fixation_style = TextStyle {
            font_size: self.params.font_size * 2.0,
            ..style.clone()
        };

        let fixation =
            self.surface
                .create_fixation(FIXATION_GLYPH, &fixation_style, -self.params.width / 2.0);

        let lower = self.surface.create_lower_layer(&style);
        let mut words = Vec::with_capacity(self.sentence.len());
        let mut word_by_region = HashMap::with_capacity(self.sentence.len());
        for word in self.sentence.words() {
            let region = self.surface.append_word(lower, word);
            self.surface.append_spacing(lower, " ");
            word_by_region.insert(region, word.index);
            words.push(region);
        }
        self.surface.set_obscured(lower, true);

        let upper = self.surface.create_upper_layer(self.sentence.text(), &style);
        self.surface.set_obscured(upper, true);

        let overlay = self
            .surface
            .create_overlay(self.params.overlay.width, self.params.overlay.height);
        self.surface.set_visible(overlay, false);

        self.subscribe(Subscription::PointerEnter(fixation));
        self.subscribe(Subscription::PointerEnter(lower));
        self.subscribe(Subscription::PointerLeave(lower));
        for &region in &words {
            self.subscribe(Subscription::PointerEnter(region));
            self.subscribe(Subscription::PointerLeave(region));
        }
        self.subscribe(Subscription::PointerMove);

        self.geometry = self
            .sentence
            .words()
            .iter()
            .zip(&words)
            .map(|(word, &region)| WordGeometry {
                index: word.index,
                text: word.text.clone(),
                rect: self.surface.bounding_rect(region),
            })
            .collect();

        self.layout = Some(Layout {
            fixation,
            upper,
            lower,
            overlay,
            words,
            word_by_region,
        });

        self.origin_ms = self.clock.now_ms();
        self.lifecycle = Lifecycle::Active;

        info!(
            words = self.sentence.len(),
            min_duration_ms = self.params.min_duration_ms,
            "trial activated"
        );
        self.emit(Event::TrialActivated {
            timestamp: Utc::now(),
            words: self.sentence.len(),
            min_duration_ms: self.params.min_duration_ms,
        });

        Ok(())
    }

    /// Processes one pointer input from the host.
    ///
    /// Inputs for which the controller holds no live subscription are
    /// ignored, as is everything outside the active lifecycle.
    pub fn handle(&mut self, input: HostInput) {
        if self.lifecycle != Lifecycle::Active {
            return;
        }

        match input {
            HostInput::PointerEnter(region) => {
                if !self.listening(Subscription::PointerEnter(region)) {
                    return;
                }
                match self.target(region) {
                    Target::Fixation => self.on_fixation_enter(),
                    Target::TextBody => self.set_overlay_shown(true),
                    Target::Word(index) => self.record(index, EventKind::Enter),
                    Target::Unknown => {}
                }
            }
            HostInput::PointerLeave(region) => {
                if !self.listening(Subscription::PointerLeave(region)) {
                    return;
                }
                match self.target(region) {
                    Target::TextBody => self.set_overlay_shown(false),
                    Target::Word(index) => self.record(index, EventKind::Leave),
                    Target::Fixation | Target::Unknown => {}
                }
            }
            HostInput::PointerMove { x, y } => {
                if !self.listening(Subscription::PointerMove) {
                    return;
                }
                if let Some(layout) = &self.layout {
                    let overlay = layout.overlay;
                    self.surface.move_to(
                        overlay,
                        x + self.params.overlay.offset_x,
                        y + self.params.overlay.offset_y,
                    );
                }
            }
        }
    }

    /// Applies a timer that elapsed. Stale or unknown timers are ignored,
    /// so each scheduled delay takes effect at most once.
    pub fn fire_timer(&mut self, fired: FiredTimer) {
        if self.lifecycle != Lifecycle::Active {
            return;
        }
        if self.timers.get(&fired.kind) != Some(&fired.id) {
            debug!(kind = %fired.kind, task = fired.id.0, "ignoring stale timer");
            return;
        }
        self.timers.remove(&fired.kind);

        let Some(layout) = &self.layout else {
            return;
        };
        let (fixation, upper, lower) = (layout.fixation, layout.upper, layout.lower);
        let elapsed_ms = self.stamp();

        match fired.kind {
            TimerKind::HideFixation => {
                self.surface.set_visible(fixation, false);
                debug!(elapsed_ms, "fixation marker hidden");
                self.emit(Event::FixationHidden {
                    timestamp: Utc::now(),
                    elapsed_ms,
                });
            }
            TimerKind::Reveal => {
                self.surface.set_obscured(upper, false);
                self.surface.set_obscured(lower, false);
                self.reveal = RevealState::Visible;
                info!(elapsed_ms, "text revealed");
                self.emit(Event::Revealed {
                    timestamp: Utc::now(),
                    elapsed_ms,
                });
            }
        }
    }

    /// Handles the participant's continue action.
    ///
    /// Completes the trial only when the minimum duration has elapsed and
    /// the text is visible; otherwise the action is swallowed. The result
    /// is produced at most once.
    pub fn request_continue(&mut self) -> ContinueOutcome {
        match self.lifecycle {
            Lifecycle::Constructed => return ContinueOutcome::Refused(GateRefusal::NotActivated),
            Lifecycle::Completed | Lifecycle::Disposed => return ContinueOutcome::Finished,
            Lifecycle::Active => {}
        }

        let elapsed_ms = self.stamp();
        let refusal = if elapsed_ms < self.params.min_duration_ms {
            Some(GateRefusal::MinimumDuration {
                elapsed_ms,
                required_ms: self.params.min_duration_ms,
            })
        } else if self.reveal != RevealState::Visible {
            Some(GateRefusal::NotRevealed)
        } else {
            None
        };

        if let Some(refusal) = refusal {
            debug!(elapsed_ms, reason = refusal.as_str(), "continue swallowed");
            self.emit(Event::ContinueRefused {
                timestamp: Utc::now(),
                elapsed_ms,
                reason: refusal.as_str().to_owned(),
            });
            return ContinueOutcome::Refused(refusal);
        }

        let result = TrialResult::new(
            std::mem::take(&mut self.log),
            std::mem::take(&mut self.geometry),
        );
        self.lifecycle = Lifecycle::Completed;
        self.release();

        info!(
            elapsed_ms,
            word_events = result.word_events().len(),
            "trial completed"
        );
        self.emit(Event::TrialCompleted {
            timestamp: Utc::now(),
            elapsed_ms,
            word_events: result.word_events().len(),
        });

        ContinueOutcome::Completed(result)
    }

    /// Cancels pending timers and removes every subscription.
    ///
    /// Safe to call at any point and more than once; also runs on drop.
    pub fn dispose(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        let completed = self.lifecycle == Lifecycle::Completed;
        let cancelled_timers = self.release();
        self.lifecycle = Lifecycle::Disposed;

        debug!(completed, cancelled_timers, "trial disposed");
        self.emit(Event::TrialDisposed {
            timestamp: Utc::now(),
            completed,
            cancelled_timers,
        });
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// The tokenized sentence.
    #[must_use]
    pub const fn sentence(&self) -> &Sentence {
        &self.sentence
    }

    /// The trial parameters.
    #[must_use]
    pub const fn params(&self) -> &TrialParams {
        &self.params
    }

    /// Current lifecycle stage.
    #[must_use]
    pub const fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Current visibility sub-state.
    #[must_use]
    pub const fn reveal_state(&self) -> RevealState {
        self.reveal
    }

    /// Whether the overlay is currently shown.
    #[must_use]
    pub const fn overlay_shown(&self) -> bool {
        self.overlay_shown
    }

    /// Events logged so far (empty after completion).
    #[must_use]
    pub fn events(&self) -> &[WordEvent] {
        self.log.as_slice()
    }

    /// Milliseconds since render, or 0 before activation.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        if self.lifecycle == Lifecycle::Constructed {
            return 0.0;
        }
        (self.clock.now_ms() - self.origin_ms).max(self.last_elapsed_ms)
    }

    /// The rendering surface.
    #[must_use]
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// The scheduler owning this controller's timers.
    #[must_use]
    pub const fn scheduler(&self) -> &T {
        &self.scheduler
    }

    /// Number of live pointer subscriptions held.
    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Region of the fixation marker, once activated.
    #[must_use]
    pub fn fixation_region(&self) -> Option<RegionId> {
        self.layout.as_ref().map(|l| l.fixation)
    }

    /// Region of the lower text layer, once activated.
    #[must_use]
    pub fn text_body_region(&self) -> Option<RegionId> {
        self.layout.as_ref().map(|l| l.lower)
    }

    /// Region of the overlay, once activated.
    #[must_use]
    pub fn overlay_region(&self) -> Option<RegionId> {
        self.layout.as_ref().map(|l| l.overlay)
    }

    /// Region of word `index`, once activated.
    #[must_use]
    pub fn word_region(&self, index: usize) -> Option<RegionId> {
        self.layout.as_ref().and_then(|l| l.words.get(index).copied())
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn on_fixation_enter(&mut self) {
        if self.reveal != RevealState::Hidden {
            return;
        }
        self.reveal = RevealState::Unlocked;

        if let Some(fixation) = self.fixation_region() {
            if let Some(id) = self
                .subscriptions
                .remove(&Subscription::PointerEnter(fixation))
            {
                self.surface.unsubscribe(id);
            }
        }

        let timing = self.params.timing;
        let hide = self.scheduler.schedule(
            TimerKind::HideFixation,
            Duration::from_millis(timing.fixation_hide_ms),
        );
        let reveal = self
            .scheduler
            .schedule(TimerKind::Reveal, Duration::from_millis(timing.reveal_ms));
        self.timers.insert(TimerKind::HideFixation, hide);
        self.timers.insert(TimerKind::Reveal, reveal);

        let elapsed_ms = self.stamp();
        info!(elapsed_ms, "fixation entered; reveal scheduled");
        self.emit(Event::FixationEntered {
            timestamp: Utc::now(),
            elapsed_ms,
        });
    }

    fn record(&mut self, index: usize, kind: EventKind) {
        let Some(word) = self.sentence.word(index) else {
            return;
        };
        let text = word.text.clone();
        let elapsed_ms = self.stamp();
        debug!(index, ?kind, elapsed_ms, "word event");
        self.log.push(WordEvent {
            index,
            text,
            kind,
            elapsed_ms,
        });
    }

    fn set_overlay_shown(&mut self, shown: bool) {
        if let Some(overlay) = self.overlay_region() {
            self.surface.set_visible(overlay, shown);
            self.overlay_shown = shown;
        }
    }

    /// Elapsed time for a new log entry, clamped so the log never runs
    /// backwards.
    fn stamp(&mut self) -> f64 {
        let elapsed = (self.clock.now_ms() - self.origin_ms)
            .max(self.last_elapsed_ms)
            .max(0.0);
        self.last_elapsed_ms = elapsed;
        elapsed
    }

    fn target(&self, region: RegionId) -> Target {
        let Some(layout) = &self.layout else {
            return Target::Unknown;
        };
        if region == layout.fixation {
            Target::Fixation
        } else if region == layout.lower {
            Target::TextBody
        } else if let Some(&index) = layout.word_by_region.get(&region) {
            Target::Word(index)
        } else {
            Target::Unknown
        }
    }

    fn subscribe(&mut self, subscription: Subscription) {
        let id = self.surface.subscribe(subscription);
        self.subscriptions.insert(subscription, id);
    }

    fn listening(&self, subscription: Subscription) -> bool {
        self.subscriptions.contains_key(&subscription)
    }

    /// Cancels timers and drops subscriptions; returns how many timers
    /// were still pending.
    fn release(&mut self) -> usize {
        let cancelled = self.timers.len();
        for (_, id) in self.timers.drain() {
            self.scheduler.cancel(id);
        }
        for (_, id) in self.subscriptions.drain() {
            self.surface.unsubscribe(id);
        }
        if self.overlay_shown {
            self.set_overlay_shown(false);
        }
        cancelled
    }

    fn emit(&self, event: Event) {
        if let Some(emitter) = &self.emitter {
            emitter.emit(event);
        }
    }
}

impl<S: Surface, C: Clock, T: Scheduler> Drop for TrialController<S, C, T> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<S: Surface, C: Clock, T: Scheduler> std::fmt::Debug for TrialController<S, C, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrialController")
            .field("words", &self.sentence.len())
            .field("lifecycle", &self.lifecycle)
            .field("reveal", &self.reveal)
            .field("events", &self.log.len())
            .finish_non_exhaustive()
    }
}
