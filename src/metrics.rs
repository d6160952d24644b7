//! Process-wide executor counters and serializable stats snapshots.

#![forbid(unsafe_code)]

use std::sync::atomic::{AtomicU64, AtomicUsize};

use serde::Serialize;

/// Executor label reported in stats documents.
pub const EXECUTOR_NAME: &str = "adaptive";

/// Shared atomic counters driving the sizing heuristics.
///
/// All updates use relaxed ordering; the counters feed heuristic decisions
/// and diagnostics, not correctness-critical ordering.
#[derive(Debug, Default)]
pub struct ExecutorMetrics {
    /// Live worker threads.
    pub threads_running: AtomicUsize,
    /// Workers currently inside a user task.
    pub threads_in_use: AtomicUsize,
    /// Workers spawned but not yet through their first run interval.
    pub threads_pending: AtomicUsize,
    /// Ordinary tasks admitted and not yet started.
    pub tasks_queued: AtomicUsize,
    /// Deferred tasks admitted and not yet started.
    pub deferred_tasks_queued: AtomicUsize,
    /// Tasks ever admitted.
    pub total_queued: AtomicU64,
    /// Tasks ever completed.
    pub total_executed: AtomicU64,
    /// Ticks tasks spent waiting between admission and start.
    pub total_spent_queued: AtomicU64,
    /// Running-timer ticks folded in from retired workers.
    pub past_threads_spent_running: AtomicU64,
    /// Executing-timer ticks folded in from retired workers.
    pub past_threads_spent_executing: AtomicU64,
}

/// Point-in-time stats snapshot, shaped for the `serviceExecutorTaskStats`
/// sub-document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    /// Executor label, always `"adaptive"`.
    pub executor: &'static str,
    /// Tasks ever admitted.
    pub total_queued: u64,
    /// Tasks ever completed.
    pub total_executed: u64,
    /// Ordinary tasks admitted and not yet started.
    pub tasks_queued: usize,
    /// Deferred tasks admitted and not yet started.
    pub deferred_tasks_queued: usize,
    /// Workers currently inside a user task.
    pub threads_in_use: usize,
    /// Aggregate wall time workers spent inside reactor runs (µs).
    pub total_time_running_micros: u64,
    /// Aggregate wall time workers spent inside user tasks (µs).
    pub total_time_executing_micros: u64,
    /// Aggregate time tasks spent queued before starting (µs).
    pub total_time_queued_micros: u64,
    /// Live worker threads.
    pub threads_running: usize,
    /// Workers spawned but not yet through their first run interval.
    pub threads_pending: usize,
}
