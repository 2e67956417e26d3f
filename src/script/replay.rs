//! Deterministic script replay.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::error::ScriptError;
use crate::observability::events::EventEmitter;
use crate::surface::{HeadlessSurface, PointerRouter};
use crate::trial::clock::ManualClock;
use crate::trial::controller::{ContinueOutcome, GateRefusal, TrialController};
use crate::trial::model::{RevealState, TrialParams, TrialResult};
use crate::trial::scheduler::{ManualScheduler, Scheduler};
use crate::trial::surface::{HostInput, Surface};

use super::{Action, Script};

type ReplayController = TrialController<HeadlessSurface, ManualClock, ManualScheduler>;

/// Point far outside any viewport.
const OUTSIDE: (f64, f64) = (-1.0, -1.0);

/// What happened during a replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    /// The trial result, if a continue press passed the gate.
    pub result: Option<TrialResult>,
    /// Continue presses that were swallowed, in order.
    pub refusals: Vec<GateRefusal>,
    /// Visibility state when the replay ended.
    pub reveal_state: RevealState,
    /// Steps skipped because the trial had already completed.
    pub skipped_steps: usize,
}

/// Replays `script` with `params` on a fresh headless surface.
///
/// Time only moves forward to each step's `at_ms`; timers due on the way
/// fire at their exact due time before the step is applied. Steps after
/// a successful continue are skipped.
///
/// # Errors
///
/// Returns [`ScriptError`] if the timeline is invalid, a step names a
/// word that does not exist, or the trial cannot be built.
pub fn replay(
    script: &Script,
    params: TrialParams,
    emitter: Option<Arc<EventEmitter>>,
) -> Result<ReplayReport, ScriptError> {
    script.check_timeline()?;
    if script.steps.is_empty() {
        warn!("replay script has no steps; the trial cannot complete");
    }

    let clock = ManualClock::new();
    let timers = ManualScheduler::new(clock.clone());
    let mut controller = TrialController::new(
        &script.sentence,
        params,
        HeadlessSurface::new(script.viewport),
        clock.clone(),
        timers.clone(),
    )?;
    if let Some(emitter) = emitter {
        controller = controller.with_emitter(emitter);
    }

    let words = controller.sentence().len();
    for (step, entry) in script.steps.iter().enumerate() {
        if let Action::HoverWord { index } = entry.action {
            if index >= words {
                return Err(ScriptError::UnknownWord { step, index, words });
            }
        }
    }

    controller.activate()?;
    info!(
        words,
        steps = script.steps.len(),
        "replaying scripted trial"
    );

    let mut router = PointerRouter::new();
    let mut report = ReplayReport {
        result: None,
        refusals: Vec::new(),
        reveal_state: RevealState::Hidden,
        skipped_steps: 0,
    };

    for (step, entry) in script.steps.iter().enumerate() {
        if report.result.is_some() {
            report.skipped_steps += 1;
            continue;
        }

        advance_to(&mut controller, &clock, &timers, entry.at_ms);
        debug!(step, at_ms = entry.at_ms, action = ?entry.action, "applying step");

        let target = match entry.action {
            Action::HoverFixation => Some(fixation_center(&controller)),
            Action::HoverWord { index } => Some(word_center(&controller, index)),
            Action::HoverOutside => Some(OUTSIDE),
            Action::Move { x, y } => Some((x, y)),
            Action::Continue => None,
        };

        if let Some((x, y)) = target {
            let inputs = router.pointer_to(controller.surface(), x, y);
            dispatch(&mut controller, inputs);
            continue;
        }

        match controller.request_continue() {
            ContinueOutcome::Completed(result) => report.result = Some(result),
            ContinueOutcome::Refused(refusal) => report.refusals.push(refusal),
            ContinueOutcome::Finished => {}
        }
    }

    if report.skipped_steps > 0 {
        debug!(
            skipped = report.skipped_steps,
            "steps after completion ignored"
        );
    }
    report.reveal_state = controller.reveal_state();
    controller.dispose();
    debug_assert_eq!(timers.pending(), 0);

    Ok(report)
}

/// Moves the clock to `at_ms`, firing every timer due on the way at its
/// own due time.
fn advance_to(
    controller: &mut ReplayController,
    clock: &ManualClock,
    timers: &ManualScheduler,
    at_ms: f64,
) {
    for (due_ms, fired) in timers.take_due(at_ms) {
        clock.set(due_ms);
        controller.fire_timer(fired);
    }
    clock.set(at_ms);
}

fn dispatch(controller: &mut ReplayController, inputs: Vec<HostInput>) {
    for input in inputs {
        controller.handle(input);
    }
}

fn fixation_center(controller: &ReplayController) -> (f64, f64) {
    controller
        .fixation_region()
        .map_or(OUTSIDE, |r| controller.surface().bounding_rect(r).center())
}

fn word_center(controller: &ReplayController, index: usize) -> (f64, f64) {
    controller
        .word_region(index)
        .map_or(OUTSIDE, |r| controller.surface().bounding_rect(r).center())
}
