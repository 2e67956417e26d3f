//! Monotonic time sources.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::time::Instant;

/// Monotonic millisecond clock with an arbitrary epoch.
pub trait Clock {
    /// Milliseconds since the clock's epoch.
    fn now_ms(&self) -> f64;
}

/// Clock backed by `tokio::time::Instant`, so paused-time tests can
/// advance it.
#[derive(Debug, Clone, Copy)]
pub struct TokioClock {
    epoch: Instant,
}

impl TokioClock {
    /// Creates a clock whose epoch is now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for TokioClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for TokioClock {
    fn now_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually advanced clock. Clones share the same reading.
///
/// Used by scripted replay and by tests that need exact timestamps.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading 0 ms.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current reading. Earlier values are ignored so the clock
    /// never runs backwards.
    pub fn set(&self, ms: f64) {
        if ms.is_finite() && ms > self.now_ms() {
            self.bits.store(ms.to_bits(), Ordering::SeqCst);
        }
    }

    /// Advances the reading by `delta_ms`.
    pub fn advance(&self, delta_ms: f64) {
        self.set(self.now_ms() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn manual_clock_is_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.set(1200.0);
        assert!((other.now_ms() - 1200.0).abs() < f64::EPSILON);
    }

    #[test]
    fn manual_clock_never_goes_backwards() {
        let clock = ManualClock::new();
        clock.set(500.0);
        clock.set(100.0);
        assert!((clock.now_ms() - 500.0).abs() < f64::EPSILON);
        clock.advance(250.0);
        assert!((clock.now_ms() - 750.0).abs() < f64::EPSILON);
    }

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_follows_paused_time() {
        let clock = TokioClock::new();
        tokio::time::advance(Duration::from_millis(1500)).await;
        let now = clock.now_ms();
        assert!((1500.0..1501.0).contains(&now), "got {now}");
    }
}
