//! Adaptive worker pool and task admission.
//!
//! A pool of worker threads drives a shared [`Reactor`] in bounded run
//! intervals while a single controller thread resizes the pool: it spawns
//! workers when queued tasks outnumber free threads, breaks apparent
//! deadlocks by starting the reserve, and lets underutilized workers retire
//! themselves. Task admission wraps every task with queue/executing
//! accounting and chooses between the reactor's `post` and `dispatch` entry
//! points depending on the caller's recursion depth.

#![forbid(unsafe_code)]

use std::cell::RefCell;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::config::ExecutorConfig;
use crate::metrics::{ExecutorMetrics, TaskStats, EXECUTOR_NAME};
use crate::reactor::{Reactor, Task, WorkGuard};
use crate::ticks::{ticks_to_micros, IntervalTimer, MonotonicTicks, TickSource, TickTimer};

#[cfg(feature = "tracing")]
use tracing::{debug, info, warn};

bitflags::bitflags! {
    /// Admission flags for [`AdaptiveExecutor::schedule`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct ScheduleFlags: u32 {
        /// The task may execute inline on the admitting worker while the
        /// recursion depth stays under the configured limit.
        const MAY_RECURSE = 1 << 0;
        /// The task is deferrable: it counts against the deferred queue and
        /// never triggers starvation wakeups.
        const DEFERRED_TASK = 1 << 1;
    }
}

/// Errors surfaced by the executor.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// `schedule` was called while the executor is not running.
    #[error("executor is not running")]
    ShutdownInProgress,

    /// `shutdown` timed out with worker threads still live.
    #[error("worker threads did not drain within the shutdown time limit")]
    ExceededTimeLimit,

    /// The OS refused to launch a worker thread.
    #[error("failed to launch worker thread: {0}")]
    ThreadLaunchFailed(#[from] io::Error),
}

/// Which per-thread timer to aggregate.
#[derive(Debug, Clone, Copy)]
enum ThreadTimer {
    Running,
    Executing,
}

/// Per-worker accounting; one entry per live worker in the pool's thread
/// list. The owning worker is the only writer of the timers' start/stop
/// pairs; the controller reads committed totals concurrently.
struct WorkerState {
    running: IntervalTimer,
    executing: IntervalTimer,
    /// Executing ticks committed during the current run interval.
    executing_cur_run: AtomicU64,
    /// Nested depth of user tasks on this worker; 0 when not in a task.
    recursion_depth: AtomicU32,
}

impl WorkerState {
    fn new(source: &Arc<dyn TickSource>) -> Self {
        Self {
            running: IntervalTimer::new(Arc::clone(source)),
            executing: IntervalTimer::new(Arc::clone(source)),
            executing_cur_run: AtomicU64::new(0),
            recursion_depth: AtomicU32::new(0),
        }
    }
}

thread_local! {
    /// Set for the lifetime of a worker thread; `None` on every other thread.
    static LOCAL_WORKER: RefCell<Option<Arc<WorkerState>>> = const { RefCell::new(None) };
}

fn current_worker() -> Option<Arc<WorkerState>> {
    LOCAL_WORKER.with(|w| w.borrow().clone())
}

/// Shared random engine for run-time jitter. Draws happen once per worker
/// lifetime, so one engine behind a mutex is plenty.
static JITTER_RNG: Lazy<Mutex<StdRng>> = Lazy::new(|| Mutex::new(StdRng::from_entropy()));

/// Draws a uniformly random jitter in `[-half_width_ms, +half_width_ms]`,
/// normalized to 0 when the magnitude would exceed `run_time_ms`.
fn draw_jitter(half_width_ms: u64, run_time_ms: u64) -> i64 {
    if half_width_ms == 0 {
        return 0;
    }
    let half = half_width_ms as i64;
    let jitter = JITTER_RNG.lock().gen_range(-half..=half);
    if jitter.unsigned_abs() > run_time_ms {
        0
    } else {
        jitter
    }
}

/// Adaptive task executor.
///
/// Dispatches opaque tasks onto a shared [`Reactor`] and keeps the worker
/// pool sized to the offered load. See the module docs for the sizing
/// policy.
pub struct AdaptiveExecutor {
    inner: Arc<Inner>,
}

struct Inner {
    reactor: Arc<dyn Reactor>,
    config: Arc<ExecutorConfig>,
    tick_source: Arc<dyn TickSource>,
    ticks_per_micro: u64,
    metrics: ExecutorMetrics,
    /// Live workers. Each worker holds its own `Arc` as a stable handle and
    /// erases it by pointer identity at retirement.
    threads: Mutex<Vec<Arc<WorkerState>>>,
    is_running: AtomicBool,
    /// Reset on every successful admission; the controller reads it to tell
    /// an idle pool from a stuck one.
    last_schedule_timer: TickTimer,
    /// Wakeup channel for the controller. Signalling is best-effort; the
    /// controller re-polls the counters on every wake.
    schedule_condition: Condvar,
    /// Signalled by each retiring worker; `shutdown` waits on it under the
    /// threads mutex for the list to drain.
    death_condition: Condvar,
    controller: Mutex<Option<thread::JoinHandle<()>>>,
}

impl AdaptiveExecutor {
    /// Creates an executor over `reactor` with default configuration and a
    /// nanosecond monotonic tick source.
    #[must_use]
    pub fn new(reactor: Arc<dyn Reactor>) -> Self {
        Self::with_config(
            reactor,
            Arc::new(ExecutorConfig::default()),
            Arc::new(MonotonicTicks::new()),
        )
    }

    /// Creates an executor with explicit configuration and tick source.
    ///
    /// # Panics
    ///
    /// Panics if the tick source resolution is below one microsecond.
    #[must_use]
    pub fn with_config(
        reactor: Arc<dyn Reactor>,
        config: Arc<ExecutorConfig>,
        tick_source: Arc<dyn TickSource>,
    ) -> Self {
        let ticks_per_second = tick_source.ticks_per_second();
        assert!(
            ticks_per_second >= 1_000_000,
            "tick source must have at least microsecond resolution"
        );
        let last_schedule_timer = TickTimer::new(Arc::clone(&tick_source));
        Self {
            inner: Arc::new(Inner {
                reactor,
                config,
                ticks_per_micro: ticks_per_second / 1_000_000,
                tick_source,
                metrics: ExecutorMetrics::default(),
                threads: Mutex::new(Vec::new()),
                is_running: AtomicBool::new(false),
                last_schedule_timer,
                schedule_condition: Condvar::new(),
                death_condition: Condvar::new(),
                controller: Mutex::new(None),
            }),
        }
    }

    /// Launches the controller thread and the reserved workers.
    ///
    /// # Panics
    ///
    /// Panics if the executor is already running.
    pub fn start(&self) -> Result<(), ExecutorError> {
        assert!(
            !self.inner.is_running.swap(true, Ordering::Relaxed),
            "executor already running"
        );

        let controller = Arc::clone(&self.inner);
        let handle = match thread::Builder::new()
            .name("worker-controller".into())
            .spawn(move || controller.controller_thread_routine())
        {
            Ok(handle) => handle,
            Err(err) => {
                self.inner.is_running.store(false, Ordering::Relaxed);
                return Err(ExecutorError::ThreadLaunchFailed(err));
            }
        };
        *self.inner.controller.lock() = Some(handle);

        for _ in 0..self.inner.config.reserved_threads() {
            if Inner::start_worker_thread(&self.inner).is_err() {
                // Launch failures were logged and rolled back; the
                // controller replenishes the reserve on its next round.
                break;
            }
        }

        Ok(())
    }

    /// Stops the executor and waits up to `timeout` for workers to drain.
    ///
    /// Idempotent: repeat calls skip the controller teardown and only wait
    /// for any remaining workers.
    pub fn shutdown(&self, timeout: Duration) -> Result<(), ExecutorError> {
        if self.inner.is_running.swap(false, Ordering::Relaxed) {
            self.inner.schedule_condition.notify_one();
            if let Some(handle) = self.inner.controller.lock().take() {
                let _ = handle.join();
            }
        }

        let mut threads = self.inner.threads.lock();
        self.inner.reactor.stop();

        let deadline = Instant::now().checked_add(timeout);
        while !threads.is_empty() {
            match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(ExecutorError::ExceededTimeLimit);
                    }
                    self.inner
                        .death_condition
                        .wait_for(&mut threads, deadline - now);
                }
                None => {
                    self.inner.death_condition.wait(&mut threads);
                }
            }
        }

        Ok(())
    }

    /// Admits one task.
    ///
    /// With [`ScheduleFlags::MAY_RECURSE`] and a calling worker below the
    /// recursion limit the task is dispatched and may run inline; otherwise
    /// it is posted for a future reactor turn.
    pub fn schedule<F>(&self, task: F, flags: ScheduleFlags) -> Result<(), ExecutorError>
    where
        F: FnOnce() + Send + 'static,
    {
        Inner::schedule(&self.inner, Box::new(task), flags)
    }

    /// Current stats snapshot.
    pub fn stats(&self) -> TaskStats {
        let inner = &self.inner;
        let metrics = &inner.metrics;
        TaskStats {
            executor: EXECUTOR_NAME,
            total_queued: metrics.total_queued.load(Ordering::Relaxed),
            total_executed: metrics.total_executed.load(Ordering::Relaxed),
            tasks_queued: metrics.tasks_queued.load(Ordering::Relaxed),
            deferred_tasks_queued: metrics.deferred_tasks_queued.load(Ordering::Relaxed),
            threads_in_use: metrics.threads_in_use.load(Ordering::Relaxed),
            total_time_running_micros: ticks_to_micros(
                inner.thread_timer_total(ThreadTimer::Running),
                inner.ticks_per_micro,
            ),
            total_time_executing_micros: ticks_to_micros(
                inner.thread_timer_total(ThreadTimer::Executing),
                inner.ticks_per_micro,
            ),
            total_time_queued_micros: ticks_to_micros(
                metrics.total_spent_queued.load(Ordering::Relaxed),
                inner.ticks_per_micro,
            ),
            threads_running: metrics.threads_running.load(Ordering::Relaxed),
            threads_pending: metrics.threads_pending.load(Ordering::Relaxed),
        }
    }

    /// Appends the `serviceExecutorTaskStats` sub-document to `doc`.
    pub fn append_stats(&self, doc: &mut serde_json::Map<String, serde_json::Value>) {
        doc.insert(
            "serviceExecutorTaskStats".to_string(),
            serde_json::json!(self.stats()),
        );
    }

    /// Shared counter set, readable at any time.
    pub fn metrics(&self) -> &ExecutorMetrics {
        &self.inner.metrics
    }

    /// Live configuration.
    pub fn config(&self) -> &ExecutorConfig {
        &self.inner.config
    }
}

impl Drop for AdaptiveExecutor {
    fn drop(&mut self) {
        let _ = self.shutdown(Duration::from_secs(10));
    }
}

/// Releases the admission bookkeeping on both normal and panic exit paths
/// of a wrapped task.
struct TaskGuard<'a> {
    inner: &'a Inner,
    worker: Option<Arc<WorkerState>>,
}

impl<'a> TaskGuard<'a> {
    fn enter(inner: &'a Inner) -> Self {
        let worker = current_worker();
        if let Some(state) = &worker {
            if state.recursion_depth.fetch_add(1, Ordering::Relaxed) == 0 {
                state.executing.mark_running();
                inner.metrics.threads_in_use.fetch_add(1, Ordering::Relaxed);
            }
        }
        Self { inner, worker }
    }
}

impl Drop for TaskGuard<'_> {
    fn drop(&mut self) {
        if let Some(state) = &self.worker {
            if state.recursion_depth.fetch_sub(1, Ordering::Relaxed) == 1 {
                state
                    .executing_cur_run
                    .fetch_add(state.executing.mark_stopped(), Ordering::Relaxed);
                self.inner.metrics.threads_in_use.fetch_sub(1, Ordering::Relaxed);
            }
        }
        self.inner.metrics.total_executed.fetch_add(1, Ordering::Relaxed);
    }
}

impl Inner {
    fn schedule(this: &Arc<Self>, task: Task, flags: ScheduleFlags) -> Result<(), ExecutorError> {
        let schedule_time = this.tick_source.ticks();
        let deferred = flags.contains(ScheduleFlags::DEFERRED_TASK);
        if deferred {
            this.metrics.deferred_tasks_queued.fetch_add(1, Ordering::Relaxed);
        } else {
            this.metrics.tasks_queued.fetch_add(1, Ordering::Relaxed);
        }

        // The increment above is not rolled back on this path; it is dwarfed
        // by steady-state traffic.
        if !this.is_running.load(Ordering::Relaxed) {
            return Err(ExecutorError::ShutdownInProgress);
        }

        let inner = Arc::clone(this);
        let wrapped: Task = Box::new(move || {
            let queued_counter = if deferred {
                &inner.metrics.deferred_tasks_queued
            } else {
                &inner.metrics.tasks_queued
            };
            queued_counter.fetch_sub(1, Ordering::Relaxed);

            let start = inner.tick_source.ticks();
            inner
                .metrics
                .total_spent_queued
                .fetch_add(start.saturating_sub(schedule_time), Ordering::Relaxed);

            let _guard = TaskGuard::enter(&inner);
            task();
        });

        // Dispatching may run the task inline on the current worker; posting
        // guarantees a future reactor turn. Only a worker below the depth cap
        // may take the inline path.
        let may_recurse = flags.contains(ScheduleFlags::MAY_RECURSE)
            && LOCAL_WORKER.with(|local| {
                local.borrow().as_ref().is_some_and(|state| {
                    state.recursion_depth.load(Ordering::Relaxed) + 1
                        < this.config.recursion_limit()
                })
            });
        if may_recurse {
            this.reactor.dispatch(wrapped);
        } else {
            this.reactor.post(wrapped);
        }

        this.last_schedule_timer.reset();
        this.metrics.total_queued.fetch_add(1, Ordering::Relaxed);

        // Deferred tasks never count against starvation avoidance.
        if !deferred && this.is_starved() {
            this.schedule_condition.notify_one();
        }

        Ok(())
    }

    fn is_starved(&self) -> bool {
        // Startups in flight will absorb work shortly.
        if self.metrics.threads_pending.load(Ordering::Relaxed) > 0 {
            return false;
        }

        let tasks_queued = self.metrics.tasks_queued.load(Ordering::Relaxed);
        if tasks_queued == 0 {
            return false;
        }

        let available = self
            .metrics
            .threads_running
            .load(Ordering::Relaxed)
            .saturating_sub(self.metrics.threads_in_use.load(Ordering::Relaxed));

        tasks_queued > available
    }

    fn start_worker_thread(this: &Arc<Self>) -> Result<(), ExecutorError> {
        let mut threads = this.threads.lock();
        let state = Arc::new(WorkerState::new(&this.tick_source));
        threads.push(Arc::clone(&state));
        let thread_id = threads.len();
        this.metrics.threads_pending.fetch_add(1, Ordering::Relaxed);
        this.metrics.threads_running.fetch_add(1, Ordering::Relaxed);
        drop(threads);

        let inner = Arc::clone(this);
        let worker = Arc::clone(&state);
        let launch = thread::Builder::new()
            .name(format!("worker-{thread_id}"))
            .spawn(move || inner.worker_thread_routine(thread_id, worker));

        match launch {
            Ok(_detached) => {
                #[cfg(feature = "metrics")]
                {
                    metrics::counter!("adaptive_executor_threads_spawned").increment(1);
                    metrics::gauge!("adaptive_executor_threads_running")
                        .set(this.metrics.threads_running.load(Ordering::Relaxed) as f64);
                }
                Ok(())
            }
            Err(err) => {
                #[cfg(feature = "tracing")]
                warn!(error = %err, "failed to launch new worker thread");

                let mut threads = this.threads.lock();
                this.metrics.threads_pending.fetch_sub(1, Ordering::Relaxed);
                this.metrics.threads_running.fetch_sub(1, Ordering::Relaxed);
                if let Some(pos) = threads.iter().position(|entry| Arc::ptr_eq(entry, &state)) {
                    threads.remove(pos);
                }
                Err(ExecutorError::ThreadLaunchFailed(err))
            }
        }
    }

    fn worker_thread_routine(self: Arc<Self>, thread_id: usize, state: Arc<WorkerState>) {
        LOCAL_WORKER.with(|local| *local.borrow_mut() = Some(Arc::clone(&state)));

        #[cfg(feature = "tracing")]
        info!(thread_id, "started new worker thread");

        // A pending worker runs a single task and reports back as soon as
        // possible so the controller does not keep starting threads while the
        // ones it already created are finishing startup.
        let mut still_pending = true;

        let jitter_ms = draw_jitter(
            self.config.run_time_jitter_ms(),
            self.config.worker_thread_run_time().as_millis() as u64,
        );

        while self.is_running.load(Ordering::Relaxed) {
            // Stagger wake-ups so the pool does not start/stop in lockstep.
            let base_ms = self.config.worker_thread_run_time().as_millis() as i64 + jitter_ms;
            debug_assert!(base_ms > 0, "worker run time must be positive");
            let run_time = Duration::from_millis(base_ms.max(1) as u64);

            state.executing_cur_run.store(0, Ordering::Relaxed);

            let run_result = panic::catch_unwind(AssertUnwindSafe(|| {
                let _work = WorkGuard::new(self.reactor.as_ref());
                state.running.mark_running();
                if still_pending {
                    self.reactor.run_one_for(run_time);
                } else {
                    self.reactor.run_for(run_time);
                }
                // A reactor that ran out of handlers before the first traffic
                // arrives reports stopped; restart it so the next interval is
                // usable.
                if self.reactor.stopped() {
                    self.reactor.restart();
                }
            }));

            if run_result.is_err() {
                #[cfg(feature = "tracing")]
                warn!(thread_id, "panic escaped worker thread, starting a replacement");
                let _ = Self::start_worker_thread(&self);
                break;
            }

            let spent_running = state.running.mark_stopped();

            if still_pending {
                self.metrics.threads_pending.fetch_sub(1, Ordering::Relaxed);
                still_pending = false;
            } else if self.metrics.threads_running.load(Ordering::Relaxed)
                > self.config.reserved_threads()
            {
                // This measurement excludes reactor idle waits, so the
                // threshold is lower than the wall-clock share suggests.
                let executing_cur_run = state.executing_cur_run.load(Ordering::Relaxed);
                let pct_executing = if spent_running == 0 {
                    0
                } else {
                    executing_cur_run * 100 / spent_running
                };
                debug_assert!(pct_executing <= 100);

                if pct_executing < self.config.idle_pct_threshold() {
                    #[cfg(feature = "tracing")]
                    debug!(
                        thread_id,
                        pct_executing,
                        run_time_ms = run_time.as_millis() as u64,
                        "thread was idle for most of its run interval, exiting"
                    );
                    break;
                }
            }
        }

        if still_pending {
            self.metrics.threads_pending.fetch_sub(1, Ordering::Relaxed);
        }
        self.metrics.threads_running.fetch_sub(1, Ordering::Relaxed);

        {
            // Fold lifetime ticks into the past accumulators before erasing
            // the entry, under the same lock `thread_timer_total` sums with,
            // so the pool-wide timer totals stay monotonic.
            let mut threads = self.threads.lock();
            self.metrics
                .past_threads_spent_running
                .fetch_add(state.running.total(), Ordering::Relaxed);
            self.metrics
                .past_threads_spent_executing
                .fetch_add(state.executing.total(), Ordering::Relaxed);
            if let Some(pos) = threads.iter().position(|entry| Arc::ptr_eq(entry, &state)) {
                threads.remove(pos);
            }
        }
        self.death_condition.notify_one();

        #[cfg(feature = "metrics")]
        {
            metrics::counter!("adaptive_executor_threads_retired").increment(1);
            metrics::gauge!("adaptive_executor_threads_running")
                .set(self.metrics.threads_running.load(Ordering::Relaxed) as f64);
        }

        LOCAL_WORKER.with(|local| *local.borrow_mut() = None);
    }

    fn controller_thread_routine(self: Arc<Self>) {
        #[cfg(feature = "tracing")]
        info!("starting adaptive executor controller thread");

        // The condition needs a lock to wait on, but it is a wakeup channel
        // only; the state it guards is the atomic counter set.
        let fake_mutex = Mutex::new(());
        let mut fake_lock = fake_mutex.lock();

        let since_last_control_round = TickTimer::new(Arc::clone(&self.tick_source));
        let mut last_spent_executing = self.thread_timer_total(ThreadTimer::Executing);
        let mut last_spent_running = self.thread_timer_total(ThreadTimer::Running);

        while self.is_running.load(Ordering::Relaxed) {
            let stuck_timeout = self.config.stuck_thread_timeout();
            let _ = self.schedule_condition.wait_for(&mut fake_lock, stuck_timeout);

            if !self.is_running.load(Ordering::Relaxed) {
                break;
            }

            let utilization_pct = {
                let spent_executing = self.thread_timer_total(ThreadTimer::Executing);
                let spent_running = self.thread_timer_total(ThreadTimer::Running);
                let diff_executing = spent_executing - last_spent_executing;
                let diff_running = spent_running - last_spent_running;

                // Until threads have run there is nothing to update.
                if spent_running == 0 || diff_running == 0 {
                    0
                } else {
                    last_spent_executing = spent_executing;
                    last_spent_running = spent_running;
                    diff_executing * 100 / diff_running
                }
            };

            let stuck_timeout_ticks = self.ticks_of(stuck_timeout);

            // A timed-out wait means the executor is either idle or stuck.
            if since_last_control_round.since_start() >= stuck_timeout_ticks {
                // All threads in a task and nothing admitted for a whole
                // timeout: assume the pool is blocked and start the reserve
                // to unblock it.
                if self.metrics.threads_in_use.load(Ordering::Relaxed)
                    == self.metrics.threads_running.load(Ordering::Relaxed)
                    && self.last_schedule_timer.since_start() >= stuck_timeout_ticks
                {
                    #[cfg(feature = "tracing")]
                    warn!(
                        starting = self.config.reserved_threads(),
                        "detected blocked worker threads, starting new reserve threads"
                    );

                    #[cfg(feature = "metrics")]
                    metrics::counter!("adaptive_executor_stuck_detections").increment(1);

                    for _ in 0..self.config.reserved_threads() {
                        if Self::start_worker_thread(&self).is_err() {
                            break;
                        }
                    }
                }
                since_last_control_round.reset();
                continue;
            }

            let threads_running = self.metrics.threads_running.load(Ordering::Relaxed);
            let reserved = self.config.reserved_threads();
            if threads_running < reserved {
                #[cfg(feature = "tracing")]
                info!(
                    starting = reserved - threads_running,
                    "replenishing reserved worker threads"
                );
                while self.metrics.threads_running.load(Ordering::Relaxed) < reserved {
                    if Self::start_worker_thread(&self).is_err() {
                        break;
                    }
                }
            }

            // Below the idle threshold the threads we already have are not
            // saturated; adding more would only dilute them.
            if utilization_pct < self.config.idle_pct_threshold() {
                since_last_control_round.reset();
                continue;
            }

            // Give pending startups a chance to absorb the queue before
            // provisioning more, but never longer than the stuck timeout.
            loop {
                thread::sleep(self.config.max_queue_latency());
                if self.metrics.threads_pending.load(Ordering::Relaxed) == 0
                    || since_last_control_round.since_start() >= stuck_timeout_ticks
                {
                    break;
                }
            }

            if self.is_starved() {
                #[cfg(feature = "tracing")]
                info!("starting worker thread to avoid starvation");

                #[cfg(feature = "metrics")]
                metrics::counter!("adaptive_executor_starvation_spawns").increment(1);

                let _ = Self::start_worker_thread(&self);
            }
            since_last_control_round.reset();
        }

        #[cfg(feature = "tracing")]
        info!("adaptive executor controller thread exiting");
    }

    /// Pool-wide timer total: past accumulator plus a locked pass over the
    /// live thread list. Monotonic because retiring workers fold their ticks
    /// into the accumulator before erasing their entry.
    fn thread_timer_total(&self, which: ThreadTimer) -> u64 {
        let threads = self.threads.lock();
        let mut total = match which {
            ThreadTimer::Running => self.metrics.past_threads_spent_running.load(Ordering::Relaxed),
            ThreadTimer::Executing => self
                .metrics
                .past_threads_spent_executing
                .load(Ordering::Relaxed),
        };

        for state in threads.iter() {
            total += match which {
                ThreadTimer::Running => state.running.total(),
                ThreadTimer::Executing => state.executing.total(),
            };
        }

        total
    }

    fn ticks_of(&self, duration: Duration) -> u64 {
        duration.as_micros() as u64 * self.ticks_per_micro
    }
}
