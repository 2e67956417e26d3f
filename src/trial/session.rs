//! Real-time trial driver.
//!
//! A [`TrialSession`] runs one controller on the Tokio runtime: its
//! fixation delays are real `tokio::time` sleeps, pointer input and
//! continue actions arrive on a channel, and a [`CancellationToken`]
//! aborts the trial. When the session ends the controller is dropped,
//! which cancels any pending delay and removes its subscriptions.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Span, debug, info};

use crate::error::TrialError;
use crate::observability::events::EventEmitter;
use crate::observability::logging::trial_span;

use super::clock::TokioClock;
use super::controller::{ContinueOutcome, TrialController};
use super::model::{TrialParams, TrialResult};
use super::scheduler::{FiredTimer, TokioScheduler};
use super::surface::{HostInput, Surface};

/// Input accepted by a running session.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionInput {
    /// Pointer input from the host.
    Pointer(HostInput),
    /// The participant's continue action.
    Continue,
}

/// One trial driven by the Tokio runtime.
#[derive(Debug)]
pub struct TrialSession<S: Surface> {
    controller: TrialController<S, TokioClock, TokioScheduler>,
    timers: mpsc::UnboundedReceiver<FiredTimer>,
    inputs: mpsc::Receiver<SessionInput>,
    cancel: CancellationToken,
    span: Span,
}

impl<S: Surface> TrialSession<S> {
    /// Builds and renders the trial. The trial clock starts here.
    ///
    /// # Errors
    ///
    /// Returns a [`TrialError`] if the sentence or parameters are invalid.
    pub fn start(
        text: &str,
        params: TrialParams,
        surface: S,
        inputs: mpsc::Receiver<SessionInput>,
        cancel: &CancellationToken,
        emitter: Option<Arc<EventEmitter>>,
    ) -> Result<Self, TrialError> {
        let span = trial_span("session", text.split_whitespace().count());
        let _entered = span.enter();
        let (scheduler, timers) = TokioScheduler::new(cancel);
        let mut controller =
            TrialController::new(text, params, surface, TokioClock::new(), scheduler)?;
        if let Some(emitter) = emitter {
            controller = controller.with_emitter(emitter);
        }
        controller.activate()?;

        Ok(Self {
            controller,
            timers,
            inputs,
            cancel: cancel.clone(),
            span: span.clone(),
        })
    }

    /// The running controller, e.g. to look up region handles.
    #[must_use]
    pub const fn controller(&self) -> &TrialController<S, TokioClock, TokioScheduler> {
        &self.controller
    }

    /// Processes input and timers until the trial completes.
    ///
    /// Returns `None` if the session was cancelled or the input channel
    /// closed before a continue action passed the gate.
    pub async fn run(self) -> Option<TrialResult> {
        let span = self.span.clone();
        self.pump().instrument(span).await
    }

    async fn pump(mut self) -> Option<TrialResult> {
        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    info!("trial session cancelled");
                    return None;
                }
                Some(fired) = self.timers.recv() => {
                    self.controller.fire_timer(fired);
                }
                input = self.inputs.recv() => {
                    let Some(input) = input else {
                        debug!("input channel closed; abandoning trial");
                        return None;
                    };
                    match input {
                        SessionInput::Pointer(pointer) => self.controller.handle(pointer),
                        SessionInput::Continue => match self.controller.request_continue() {
                            ContinueOutcome::Completed(result) => return Some(result),
                            ContinueOutcome::Refused(_) => {}
                            ContinueOutcome::Finished => return None,
                        },
                    }
                }
            }
        }
    }
}
