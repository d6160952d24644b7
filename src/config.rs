//! Runtime-mutable executor tuning knobs.
//!
//! Every knob lives in an atomic so it can be changed on a live executor;
//! readers pick up the new value at their next decision point.

#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicI64, AtomicU32, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// Sentinel asking for the reserve size to be computed from the core count.
pub const RESERVED_THREADS_AUTO: i64 = -1;

/// Tuning knobs for the adaptive executor.
///
/// Defaults match a short-task network service; all values can be changed at
/// runtime through the setters.
#[derive(Debug)]
pub struct ExecutorConfig {
    /// Minimum live workers; `RESERVED_THREADS_AUTO` resolves on first read.
    reserved_threads: AtomicI64,
    /// Per-interval reactor dwell time (ms).
    worker_thread_run_time_ms: AtomicU64,
    /// Half-width of the per-worker run-time jitter band (ms).
    run_time_jitter_ms: AtomicU64,
    /// Controller wake cap and stuck-detection threshold (ms).
    stuck_thread_timeout_ms: AtomicU64,
    /// Spin delay while awaiting pending-worker warmup (µs).
    max_queue_latency_us: AtomicU64,
    /// Utilization floor (%): workers below it retire, the controller above
    /// it considers scaling up.
    idle_pct_threshold: AtomicU64,
    /// Strict upper bound on inline-dispatch recursion.
    recursion_limit: AtomicU32,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            reserved_threads: AtomicI64::new(RESERVED_THREADS_AUTO),
            worker_thread_run_time_ms: AtomicU64::new(5000),
            run_time_jitter_ms: AtomicU64::new(500),
            stuck_thread_timeout_ms: AtomicU64::new(250),
            max_queue_latency_us: AtomicU64::new(500),
            idle_pct_threshold: AtomicU64::new(60),
            recursion_limit: AtomicU32::new(8),
        }
    }
}

impl ExecutorConfig {
    /// Minimum number of live worker threads.
    ///
    /// The auto sentinel is resolved to `max(2, cores / 2)` on first read and
    /// stored back, so subsequent reads see the concrete value.
    pub fn reserved_threads(&self) -> usize {
        let value = self.reserved_threads.load(Ordering::Relaxed);
        if value < 0 {
            let cores = thread::available_parallelism().map(|n| n.get()).unwrap_or(2);
            let computed = (cores / 2).max(2);
            self.reserved_threads.store(computed as i64, Ordering::Relaxed);

            #[cfg(feature = "tracing")]
            tracing::info!(
                reserved = computed,
                "no thread count configured for executor, using half the available cores"
            );

            return computed;
        }
        value as usize
    }

    /// Sets the reserve size; `RESERVED_THREADS_AUTO` re-arms auto-compute.
    pub fn set_reserved_threads(&self, value: i64) {
        self.reserved_threads.store(value, Ordering::Relaxed);
    }

    /// Per-interval reactor dwell time.
    pub fn worker_thread_run_time(&self) -> Duration {
        Duration::from_millis(self.worker_thread_run_time_ms.load(Ordering::Relaxed))
    }

    /// Sets the per-interval reactor dwell time (ms).
    pub fn set_worker_thread_run_time_ms(&self, value: u64) {
        self.worker_thread_run_time_ms.store(value, Ordering::Relaxed);
    }

    /// Half-width of the jitter band added to each worker's run time (ms).
    pub fn run_time_jitter_ms(&self) -> u64 {
        self.run_time_jitter_ms.load(Ordering::Relaxed)
    }

    /// Sets the jitter half-width (ms); zero disables jitter.
    pub fn set_run_time_jitter_ms(&self, value: u64) {
        self.run_time_jitter_ms.store(value, Ordering::Relaxed);
    }

    /// Longest the controller sleeps before running stuck detection.
    pub fn stuck_thread_timeout(&self) -> Duration {
        Duration::from_millis(self.stuck_thread_timeout_ms.load(Ordering::Relaxed))
    }

    /// Sets the controller wake cap (ms).
    pub fn set_stuck_thread_timeout_ms(&self, value: u64) {
        self.stuck_thread_timeout_ms.store(value, Ordering::Relaxed);
    }

    /// Delay between controller re-checks while workers are still starting.
    pub fn max_queue_latency(&self) -> Duration {
        Duration::from_micros(self.max_queue_latency_us.load(Ordering::Relaxed))
    }

    /// Sets the pending-warmup re-check delay (µs).
    pub fn set_max_queue_latency_us(&self, value: u64) {
        self.max_queue_latency_us.store(value, Ordering::Relaxed);
    }

    /// Utilization floor in percent.
    pub fn idle_pct_threshold(&self) -> u64 {
        self.idle_pct_threshold.load(Ordering::Relaxed)
    }

    /// Sets the utilization floor in percent.
    pub fn set_idle_pct_threshold(&self, value: u64) {
        self.idle_pct_threshold.store(value, Ordering::Relaxed);
    }

    /// Strict upper bound on inline-dispatch recursion depth.
    pub fn recursion_limit(&self) -> u32 {
        self.recursion_limit.load(Ordering::Relaxed)
    }

    /// Sets the recursion depth bound.
    pub fn set_recursion_limit(&self, value: u32) {
        self.recursion_limit.store(value, Ordering::Relaxed);
    }
}
