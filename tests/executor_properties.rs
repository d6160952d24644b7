//! Property-based tests for timer accounting and configuration boundaries.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use adaptive_executor::{
    ExecutorConfig, IntervalTimer, TickSource, TickTimer, RESERVED_THREADS_AUTO,
};
use proptest::prelude::*;

/// Hand-advanced tick source with microsecond-compatible resolution.
struct ManualTicks(AtomicU64);

impl ManualTicks {
    fn advance(&self, ticks: u64) {
        self.0.fetch_add(ticks, Ordering::Relaxed);
    }
}

impl TickSource for ManualTicks {
    fn ticks(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn ticks_per_second(&self) -> u64 {
        1_000_000_000
    }
}

proptest! {
    #[test]
    fn interval_timer_total_is_the_sum_of_committed_intervals(
        deltas in proptest::collection::vec(0u64..1_000_000, 1..50),
    ) {
        let source = Arc::new(ManualTicks(AtomicU64::new(0)));
        let timer = IntervalTimer::new(source.clone() as Arc<dyn TickSource>);

        let mut expected = 0u64;
        for delta in deltas {
            timer.mark_running();
            source.advance(delta);
            prop_assert_eq!(timer.mark_stopped(), delta);
            expected += delta;
            // Monotonic: the committed total never regresses.
            prop_assert_eq!(timer.total(), expected);
        }
    }

    #[test]
    fn interval_timer_total_excludes_the_open_interval(
        committed in 0u64..1_000_000,
        open in 1u64..1_000_000,
    ) {
        let source = Arc::new(ManualTicks(AtomicU64::new(0)));
        let timer = IntervalTimer::new(source.clone() as Arc<dyn TickSource>);

        timer.mark_running();
        source.advance(committed);
        timer.mark_stopped();

        timer.mark_running();
        source.advance(open);
        // A concurrent reader sees only the last-committed accumulator.
        prop_assert_eq!(timer.total(), committed);
    }

    #[test]
    fn tick_timer_tracks_advances_since_reset(
        before in 0u64..1_000_000,
        after in 0u64..1_000_000,
    ) {
        let source = Arc::new(ManualTicks(AtomicU64::new(7)));
        let timer = TickTimer::new(source.clone() as Arc<dyn TickSource>);

        source.advance(before);
        prop_assert_eq!(timer.since_start(), before);

        timer.reset();
        source.advance(after);
        prop_assert_eq!(timer.since_start(), after);
    }

    #[test]
    fn explicit_reserve_sizes_round_trip(value in 1i64..1024) {
        let config = ExecutorConfig::default();
        config.set_reserved_threads(value);
        prop_assert_eq!(config.reserved_threads(), value as usize);
    }

    #[test]
    fn auto_reserve_is_at_least_two(prior in 1i64..1024) {
        let config = ExecutorConfig::default();
        // Regardless of what was configured before, re-arming the sentinel
        // yields the computed floor.
        config.set_reserved_threads(prior);
        config.set_reserved_threads(RESERVED_THREADS_AUTO);
        prop_assert!(config.reserved_threads() >= 2);
    }
}
