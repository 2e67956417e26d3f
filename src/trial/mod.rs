//! Moving-window reading trials.
//!
//! A trial shows a blurred sentence behind a fixation marker. Hovering
//! the marker starts a short delay after which the text becomes legible;
//! from render onward every pointer enter and leave on a word is logged
//! with its elapsed time. The participant continues once both the
//! minimum duration has passed and the text is visible.
//!
//! - [`controller`] holds the state machine and completion gate.
//! - [`session`] drives a controller in real time on Tokio.
//! - [`surface`], [`clock`], and [`scheduler`] are the capabilities the
//!   controller is built against.

pub mod clock;
pub mod controller;
pub mod model;
pub mod scheduler;
pub mod sentence;
pub mod session;
pub mod surface;

pub use clock::{Clock, ManualClock, TokioClock};
pub use controller::{ContinueOutcome, GateRefusal, Lifecycle, TrialController};
pub use model::{
    EventKind, OverlayParams, Rect, RevealState, TimingParams, TrialParams, TrialResult,
    WordEvent, WordGeometry,
};
pub use scheduler::{FiredTimer, ManualScheduler, Scheduler, TaskId, TimerKind, TokioScheduler};
pub use sentence::{Sentence, Word};
pub use session::{SessionInput, TrialSession};
pub use surface::{HostInput, RegionId, Subscription, SubscriptionId, Surface, TextStyle};
