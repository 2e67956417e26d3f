//! Owned, cancelable scheduled tasks.
//!
//! The controller schedules its fixation delays through a [`Scheduler`]
//! and keeps the returned [`TaskId`]s, so disposing the controller can
//! cancel whatever is still pending. Fired timers come back to the
//! controller as [`FiredTimer`] values delivered by the host.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::clock::{Clock, ManualClock};

/// Which fixation-triggered delay a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Hide the fixation marker.
    HideFixation,
    /// Make the text visible.
    Reveal,
}

impl std::fmt::Display for TimerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HideFixation => write!(f, "hide-fixation"),
            Self::Reveal => write!(f, "reveal"),
        }
    }
}

/// Identifier of one scheduled task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub u64);

/// Notification that a scheduled task elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer {
    /// Task that elapsed.
    pub id: TaskId,
    /// What it was scheduled for.
    pub kind: TimerKind,
}

/// Source of cancelable delayed tasks.
pub trait Scheduler {
    /// Schedules `kind` to fire after `delay`.
    fn schedule(&mut self, kind: TimerKind, delay: Duration) -> TaskId;

    /// Cancels a task. Unknown or already fired ids are ignored.
    fn cancel(&mut self, id: TaskId);

    /// Number of tasks scheduled but not yet fired or cancelled.
    fn pending(&self) -> usize;
}

// ============================================================================
// Manual scheduler
// ============================================================================

#[derive(Debug, Clone, Copy)]
struct PendingTimer {
    id: TaskId,
    kind: TimerKind,
    due_ms: f64,
}

#[derive(Debug, Default)]
struct ManualQueue {
    pending: Vec<PendingTimer>,
    next_id: u64,
}

/// Deterministic scheduler driven by a [`ManualClock`].
///
/// Clones share the same queue: the controller owns one clone, the driver
/// keeps another and calls [`take_due`](Self::take_due) as it advances
/// time.
#[derive(Debug, Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    queue: Arc<Mutex<ManualQueue>>,
}

impl ManualScheduler {
    /// Creates a scheduler that computes due times from `clock`.
    #[must_use]
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            queue: Arc::new(Mutex::new(ManualQueue::default())),
        }
    }

    /// Removes and returns every task due at or before `until_ms`,
    /// ordered by due time then scheduling order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn take_due(&self, until_ms: f64) -> Vec<(f64, FiredTimer)> {
        let mut queue = self.queue.lock().expect("timer queue lock poisoned");
        let (mut due, rest): (Vec<_>, Vec<_>) = queue
            .pending
            .iter()
            .copied()
            .partition(|t| t.due_ms <= until_ms);
        queue.pending = rest;
        drop(queue);

        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms).then(a.id.cmp(&b.id)));
        due.into_iter()
            .map(|t| {
                (
                    t.due_ms,
                    FiredTimer {
                        id: t.id,
                        kind: t.kind,
                    },
                )
            })
            .collect()
    }

    /// Due time of the earliest pending task.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn next_due(&self) -> Option<f64> {
        self.queue
            .lock()
            .expect("timer queue lock poisoned")
            .pending
            .iter()
            .map(|t| t.due_ms)
            .min_by(f64::total_cmp)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, kind: TimerKind, delay: Duration) -> TaskId {
        let due_ms = self.clock.now_ms() + delay.as_secs_f64() * 1000.0;
        let mut queue = self.queue.lock().expect("timer queue lock poisoned");
        let id = TaskId(queue.next_id);
        queue.next_id += 1;
        queue.pending.push(PendingTimer { id, kind, due_ms });
        id
    }

    fn cancel(&mut self, id: TaskId) {
        self.queue
            .lock()
            .expect("timer queue lock poisoned")
            .pending
            .retain(|t| t.id != id);
    }

    fn pending(&self) -> usize {
        self.queue
            .lock()
            .expect("timer queue lock poisoned")
            .pending
            .len()
    }
}

// ============================================================================
// Tokio scheduler
// ============================================================================

/// Scheduler that runs each task as a `tokio::time::sleep` under its own
/// child [`CancellationToken`].
///
/// Fired tasks are delivered through the receiver returned by
/// [`new`](Self::new). Dropping the scheduler cancels everything still
/// pending.
#[derive(Debug)]
pub struct TokioScheduler {
    cancel: CancellationToken,
    tx: mpsc::UnboundedSender<FiredTimer>,
    tasks: HashMap<TaskId, (CancellationToken, JoinHandle<()>)>,
    next_id: u64,
}

impl TokioScheduler {
    /// Creates a scheduler whose tasks are also cancelled when `parent` is.
    #[must_use]
    pub fn new(parent: &CancellationToken) -> (Self, mpsc::UnboundedReceiver<FiredTimer>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                cancel: parent.child_token(),
                tx,
                tasks: HashMap::new(),
                next_id: 0,
            },
            rx,
        )
    }
}

impl Scheduler for TokioScheduler {
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    fn schedule(&mut self, kind: TimerKind, delay: Duration) -> TaskId {
        self.tasks.retain(|_, (_, handle)| !handle.is_finished());

        let id = TaskId(self.next_id);
        self.next_id += 1;

        let token = self.cancel.child_token();
        let task_token = token.clone();
        let tx = self.tx.clone();
        let handle = tokio::spawn(async move {
            tokio::select! {
                () = task_token.cancelled() => {
                    debug!(task = id.0, %kind, "scheduled task cancelled");
                }
                () = tokio::time::sleep(delay) => {
                    let _ = tx.send(FiredTimer { id, kind });
                }
            }
        });

        self.tasks.insert(id, (token, handle));
        id
    }

    fn cancel(&mut self, id: TaskId) {
        if let Some((token, _handle)) = self.tasks.remove(&id) {
            token.cancel();
        }
    }

    fn pending(&self) -> usize {
        self.tasks
            .values()
            .filter(|(_, handle)| !handle.is_finished())
            .count()
    }
}

impl Drop for TokioScheduler {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
