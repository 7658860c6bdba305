//! Pausable interval timer driven by simulated time.

use std::time::Duration;

/// Accumulates elapsed time and reports how many intervals completed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntervalTimer {
    interval: Duration,
    elapsed: Duration,
    paused: bool,
}

impl IntervalTimer {
    /// Creates a running timer that fires every `interval`.
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            elapsed: Duration::ZERO,
            paused: false,
        }
    }

    /// Adds `dt` to the timer, returning the number of completed intervals.
    ///
    /// A paused timer, or one with a zero interval, never fires.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if self.paused || self.interval.is_zero() {
            return 0;
        }

        self.elapsed = self.elapsed.saturating_add(dt);
        let mut fired = 0;
        while self.elapsed >= self.interval {
            self.elapsed -= self.interval;
            fired += 1;
        }
        fired
    }

    /// Freezes the timer, keeping the time accumulated so far.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Continues a paused timer from where it stopped.
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Discards the accumulated time and runs the timer again.
    pub fn restart(&mut self) {
        self.elapsed = Duration::ZERO;
        self.paused = false;
    }

    /// Whether the timer is currently paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Time accumulated toward the next interval.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.elapsed
    }
}
