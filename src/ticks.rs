//! Monotonic tick source and interval timers.
//!
//! All scheduling decisions in this crate are made against an integer tick
//! clock rather than `Instant` directly, so that tests can substitute a
//! controllable source and so that accumulated durations can live in plain
//! atomic counters.

#![forbid(unsafe_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Monotonic integer clock.
///
/// Implementations must be monotonic and must have at least microsecond
/// resolution; the executor asserts `ticks_per_second() >= 1_000_000` at
/// construction.
pub trait TickSource: Send + Sync {
    /// Current tick count.
    fn ticks(&self) -> u64;

    /// Ticks per wall-clock second.
    fn ticks_per_second(&self) -> u64;
}

/// `Instant`-backed tick source with nanosecond ticks.
#[derive(Debug)]
pub struct MonotonicTicks {
    origin: Instant,
}

impl MonotonicTicks {
    /// Creates a tick source anchored at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for MonotonicTicks {
    fn ticks(&self) -> u64 {
        self.origin.elapsed().as_nanos() as u64
    }

    fn ticks_per_second(&self) -> u64 {
        1_000_000_000
    }
}

/// Converts ticks to microseconds with a precomputed `ticks / µs` divisor.
#[must_use]
pub fn ticks_to_micros(ticks: u64, ticks_per_micro: u64) -> u64 {
    ticks / ticks_per_micro
}

/// Accumulating start/stop timer.
///
/// A timer belongs to exactly one thread for its `mark_running` /
/// `mark_stopped` pair; `total` is readable from any thread and returns the
/// last-committed accumulator (updated only at `mark_stopped`), so readers
/// accept skew of up to one run interval.
pub struct IntervalTimer {
    source: Arc<dyn TickSource>,
    started_at: AtomicU64,
    total: AtomicU64,
}

impl std::fmt::Debug for IntervalTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntervalTimer")
            .field("started_at", &self.started_at)
            .field("total", &self.total)
            .finish()
    }
}

impl IntervalTimer {
    /// Creates a stopped timer with an empty accumulator.
    #[must_use]
    pub fn new(source: Arc<dyn TickSource>) -> Self {
        Self {
            source,
            started_at: AtomicU64::new(0),
            total: AtomicU64::new(0),
        }
    }

    /// Marks the start of an interval.
    pub fn mark_running(&self) {
        self.started_at.store(self.source.ticks(), Ordering::Relaxed);
    }

    /// Commits the current interval into the accumulator and returns its
    /// length in ticks.
    pub fn mark_stopped(&self) -> u64 {
        let spent = self
            .source
            .ticks()
            .saturating_sub(self.started_at.load(Ordering::Relaxed));
        self.total.fetch_add(spent, Ordering::Relaxed);
        spent
    }

    /// Committed accumulated ticks.
    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }
}

/// Non-accumulating timer measuring wall ticks since the last reset.
pub struct TickTimer {
    source: Arc<dyn TickSource>,
    started_at: AtomicU64,
}

impl std::fmt::Debug for TickTimer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickTimer")
            .field("started_at", &self.started_at)
            .finish()
    }
}

impl TickTimer {
    /// Creates a timer whose epoch is now.
    #[must_use]
    pub fn new(source: Arc<dyn TickSource>) -> Self {
        let started_at = AtomicU64::new(source.ticks());
        Self { source, started_at }
    }

    /// Moves the epoch to now.
    pub fn reset(&self) {
        self.started_at.store(self.source.ticks(), Ordering::Relaxed);
    }

    /// Wall ticks elapsed since the last reset.
    pub fn since_start(&self) -> u64 {
        self.source
            .ticks()
            .saturating_sub(self.started_at.load(Ordering::Relaxed))
    }
}
