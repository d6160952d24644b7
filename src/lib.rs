//! Adaptive task executor for network services.
//!
//! This crate provides a worker-thread pool that dispatches short,
//! latency-sensitive tasks onto a shared asynchronous I/O reactor and
//! continuously adjusts the number of live worker threads to match offered
//! load: a single controller thread spawns workers when queued tasks
//! outnumber free threads or when every worker appears stuck, and
//! underutilized workers retire themselves.

#![deny(missing_docs)]
#![warn(rust_2018_idioms)]

/// Runtime-mutable executor tuning knobs
pub mod config;
/// Adaptive worker pool and task admission
pub mod executor;
/// Process-wide counters and stats snapshots
pub mod metrics;
/// Reactor contract consumed by the executor
pub mod reactor;
/// Tick source and interval timers
pub mod ticks;

// Public API exports
pub use config::{ExecutorConfig, RESERVED_THREADS_AUTO};
pub use executor::{AdaptiveExecutor, ExecutorError, ScheduleFlags};
pub use metrics::{ExecutorMetrics, TaskStats, EXECUTOR_NAME};
pub use reactor::{Reactor, Task, WorkGuard};
pub use ticks::{IntervalTimer, MonotonicTicks, TickSource, TickTimer};
