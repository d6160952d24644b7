//! Shared test support: a queue-backed reactor the executor can drive.

use std::cell::Cell;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use adaptive_executor::{Reactor, Task};

thread_local! {
    /// True while the current thread is inside one of the `run_*` calls, so
    /// `dispatch` can take the inline path.
    static IN_RUN: Cell<bool> = const { Cell::new(false) };
}

/// Minimal bounded-run event loop backed by a FIFO queue.
///
/// Semantics follow the reactor contract: `post` always defers, `dispatch`
/// runs inline on a thread currently inside `run_*`, and the reactor marks
/// itself stopped when it runs out of handlers with no outstanding work
/// guards.
pub struct TestReactor {
    queue: Mutex<VecDeque<Task>>,
    available: Condvar,
    stopped: AtomicBool,
    outstanding_work: AtomicUsize,
}

impl TestReactor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            queue: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
            stopped: AtomicBool::new(false),
            outstanding_work: AtomicUsize::new(0),
        })
    }

    fn next_task(&self, deadline: Instant) -> Option<Task> {
        let mut queue = self.queue.lock();
        loop {
            if self.stopped.load(Ordering::Relaxed) {
                return None;
            }
            if let Some(task) = queue.pop_front() {
                return Some(task);
            }
            if self.outstanding_work.load(Ordering::Relaxed) == 0 {
                // Out of handlers with no work guard: the reactor stops
                // itself, as a real event loop would.
                self.stopped.store(true, Ordering::Relaxed);
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            self.available.wait_for(&mut queue, deadline - now);
        }
    }

    fn run_task(&self, task: Task) {
        let was_in_run = IN_RUN.with(|flag| flag.replace(true));
        let result = panic::catch_unwind(AssertUnwindSafe(task));
        IN_RUN.with(|flag| flag.set(was_in_run));
        if let Err(payload) = result {
            panic::resume_unwind(payload);
        }
    }
}

impl Reactor for TestReactor {
    fn post(&self, task: Task) {
        self.queue.lock().push_back(task);
        self.available.notify_one();
    }

    fn dispatch(&self, task: Task) {
        if IN_RUN.with(|flag| flag.get()) {
            self.run_task(task);
        } else {
            self.post(task);
        }
    }

    fn run_one_for(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        if let Some(task) = self.next_task(deadline) {
            self.run_task(task);
        }
    }

    fn run_for(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            match self.next_task(deadline) {
                Some(task) => self.run_task(task),
                None => return,
            }
        }
    }

    fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
        self.available.notify_all();
    }

    fn restart(&self) {
        self.stopped.store(false, Ordering::Relaxed);
    }

    fn stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    fn work_started(&self) {
        self.outstanding_work.fetch_add(1, Ordering::Relaxed);
    }

    fn work_finished(&self) {
        self.outstanding_work.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Polls `predicate` every few milliseconds until it holds or `timeout`
/// elapses; returns whether it held.
pub fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    predicate()
}
