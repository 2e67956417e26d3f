//! Structured trial lifecycle events.
//!
//! Discrete, typed events emitted while a trial runs. Events are
//! serialized as newline-delimited JSON (JSONL) with a monotonically
//! increasing sequence number. They complement the `TrialResult`; they are
//! never part of it.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

// ---------------------------------------------------------------------------
// Event variants
// ---------------------------------------------------------------------------

/// A discrete event emitted during a trial.
///
/// Each variant is tagged with `"type"` when serialized to JSON so consumers
/// can dispatch on the event kind. `elapsed_ms` fields use the trial's own
/// time origin.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// Rendering finished and the trial clock started.
    TrialActivated {
        /// Wall-clock time of activation.
        timestamp: DateTime<Utc>,
        /// Number of word regions rendered.
        words: usize,
        /// Configured minimum duration.
        min_duration_ms: f64,
    },

    /// The pointer entered the fixation marker for the first time.
    FixationEntered {
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
        /// Trial time.
        elapsed_ms: f64,
    },

    /// The fixation marker was hidden.
    FixationHidden {
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
        /// Trial time.
        elapsed_ms: f64,
    },

    /// The text became visible.
    Revealed {
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
        /// Trial time.
        elapsed_ms: f64,
    },

    /// A continue action was swallowed by the completion gate.
    ContinueRefused {
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
        /// Trial time.
        elapsed_ms: f64,
        /// Which gate was closed (e.g. `"minimum_duration"`).
        reason: String,
    },

    /// The trial completed and its result was handed to the caller.
    TrialCompleted {
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
        /// Trial time.
        elapsed_ms: f64,
        /// Number of logged word events.
        word_events: usize,
    },

    /// The controller released its listeners and timers.
    TrialDisposed {
        /// Wall-clock time.
        timestamp: DateTime<Utc>,
        /// Whether a result had been produced.
        completed: bool,
        /// Scheduled tasks cancelled during disposal.
        cancelled_timers: usize,
    },
}

// ---------------------------------------------------------------------------
// Envelope (adds sequence number via serde flatten)
// ---------------------------------------------------------------------------

/// Wraps an [`Event`] with a monotonically increasing sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    /// Zero-based, monotonically increasing sequence counter.
    sequence: u64,
    /// The wrapped event (flattened into the same JSON object).
    #[serde(flatten)]
    event: Event,
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// Thread-safe, buffered JSONL event writer.
///
/// Each call to [`emit`](Self::emit) atomically increments the sequence
/// counter, serializes the event as a single JSON line, and flushes the
/// underlying writer. Serialization or I/O failures are silently dropped;
/// a broken event sink must never disturb a running trial.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

// Box<dyn Write> is not Debug.
impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created or opened.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock() {
            if let Ok(line) = serde_json::to_string(&envelope) {
                let _ = writeln!(w, "{line}");
                let _ = w.flush();
            }
        }
    }

    /// Returns the number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
