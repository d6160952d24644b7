//! Reactor contract consumed by the executor.
//!
//! The executor never implements event multiplexing itself; it drives an
//! external reactor through this trait. The semantics mirror a bounded-run
//! event loop: `post` always defers, `dispatch` may run inline on a thread
//! currently inside one of the `run_*` calls, and a positive work count keeps
//! an idle reactor from declaring itself out of handlers.

#![forbid(unsafe_code)]

use std::time::Duration;

/// Opaque unit of work admitted to the reactor.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Bounded-run event loop driven by the executor's workers.
pub trait Reactor: Send + Sync {
    /// Enqueues `task` for later execution on some worker. Never runs it
    /// inline on the calling thread.
    fn post(&self, task: Task);

    /// Enqueues `task`, or executes it inline when the calling thread is
    /// currently inside `run_for` / `run_one_for`.
    fn dispatch(&self, task: Task);

    /// Executes at most one handler, returning within `timeout`.
    fn run_one_for(&self, timeout: Duration);

    /// Executes handlers until the reactor is idle or `timeout` elapses.
    fn run_for(&self, timeout: Duration);

    /// Stops the reactor, unblocking in-flight `run_*` calls.
    fn stop(&self);

    /// Clears the stopped state so `run_*` calls are usable again.
    fn restart(&self);

    /// Whether the reactor is stopped.
    fn stopped(&self) -> bool;

    /// Increments the outstanding-work count. While positive, the reactor
    /// must not consider itself out of handlers.
    fn work_started(&self);

    /// Decrements the outstanding-work count.
    fn work_finished(&self);
}

/// RAII handle pinning the reactor's outstanding-work count.
///
/// A worker holds one for the span of each run interval so an empty queue
/// does not make the reactor exit mid-interval.
pub struct WorkGuard<'a> {
    reactor: &'a dyn Reactor,
}

impl<'a> WorkGuard<'a> {
    /// Registers one unit of outstanding work with `reactor`.
    pub fn new(reactor: &'a dyn Reactor) -> Self {
        reactor.work_started();
        Self { reactor }
    }
}

impl Drop for WorkGuard<'_> {
    fn drop(&mut self) {
        self.reactor.work_finished();
    }
}
