//! Inline-dispatch recursion discipline.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use adaptive_executor::{AdaptiveExecutor, ExecutorConfig, MonotonicTicks, ScheduleFlags};
use common::{wait_until, TestReactor};
use parking_lot::Mutex;

fn recursion_executor(recursion_limit: u32) -> Arc<AdaptiveExecutor> {
    let config = ExecutorConfig::default();
    config.set_reserved_threads(1);
    config.set_worker_thread_run_time_ms(50);
    config.set_run_time_jitter_ms(0);
    config.set_stuck_thread_timeout_ms(100);
    config.set_recursion_limit(recursion_limit);
    Arc::new(AdaptiveExecutor::with_config(
        TestReactor::new(),
        Arc::new(config),
        Arc::new(MonotonicTicks::new()),
    ))
}

/// Schedules a chain of `depth_left + 1` executions, each re-scheduling the
/// next with `MAY_RECURSE`. Every link records whether its child ran inline
/// (i.e. during the parent's `schedule` call).
fn chain(
    executor: &Arc<AdaptiveExecutor>,
    depth_left: usize,
    ran: Arc<AtomicUsize>,
    inline_log: Arc<Mutex<Vec<bool>>>,
) {
    let executor_for_task = Arc::clone(executor);
    let ran_in_task = Arc::clone(&ran);
    let log_in_task = Arc::clone(&inline_log);
    executor
        .schedule(
            move || {
                ran_in_task.fetch_add(1, Ordering::Relaxed);
                if depth_left > 0 {
                    let before = ran_in_task.load(Ordering::Relaxed);
                    chain(
                        &executor_for_task,
                        depth_left - 1,
                        Arc::clone(&ran_in_task),
                        Arc::clone(&log_in_task),
                    );
                    let child_ran_inline = ran_in_task.load(Ordering::Relaxed) > before;
                    log_in_task.lock().push(child_ran_inline);
                }
            },
            ScheduleFlags::MAY_RECURSE,
        )
        .unwrap();
}

#[test]
fn recursion_cap_limits_inline_dispatch_depth() {
    let executor = recursion_executor(3);
    executor.start().unwrap();

    let ran = Arc::new(AtomicUsize::new(0));
    let inline_log = Arc::new(Mutex::new(Vec::new()));
    chain(&executor, 3, Arc::clone(&ran), Arc::clone(&inline_log));

    assert!(wait_until(Duration::from_secs(2), || {
        ran.load(Ordering::Relaxed) == 4
    }));

    // The root is posted (non-worker caller). Its child runs inline, the
    // grandchild is pushed over the depth cap and posted, and the posted
    // link's own child is inline again. Log order is innermost-first.
    assert_eq!(*inline_log.lock(), vec![false, true, true]);

    executor.shutdown(Duration::from_secs(5)).unwrap();
}

#[test]
fn recursion_limit_of_one_forbids_inline_dispatch() {
    let executor = recursion_executor(1);
    executor.start().unwrap();

    let ran = Arc::new(AtomicUsize::new(0));
    let inline_log = Arc::new(Mutex::new(Vec::new()));
    chain(&executor, 2, Arc::clone(&ran), Arc::clone(&inline_log));

    assert!(wait_until(Duration::from_secs(2), || {
        ran.load(Ordering::Relaxed) == 3
    }));
    assert_eq!(*inline_log.lock(), vec![false, false]);

    executor.shutdown(Duration::from_secs(5)).unwrap();
}

#[test]
fn threads_in_use_counts_only_the_outermost_frame() {
    let executor = recursion_executor(4);
    executor.start().unwrap();

    let outer_in_use = Arc::new(AtomicUsize::new(usize::MAX));
    let inner_in_use = Arc::new(AtomicUsize::new(usize::MAX));
    let done = Arc::new(AtomicUsize::new(0));

    let executor_for_task = Arc::clone(&executor);
    let outer_slot = Arc::clone(&outer_in_use);
    let inner_slot = Arc::clone(&inner_in_use);
    let done_in_task = Arc::clone(&done);
    executor
        .schedule(
            move || {
                outer_slot.store(
                    executor_for_task
                        .metrics()
                        .threads_in_use
                        .load(Ordering::Relaxed),
                    Ordering::Relaxed,
                );

                let executor_for_inner = Arc::clone(&executor_for_task);
                let inner_slot = Arc::clone(&inner_slot);
                let done_in_inner = Arc::clone(&done_in_task);
                executor_for_task
                    .schedule(
                        move || {
                            inner_slot.store(
                                executor_for_inner
                                    .metrics()
                                    .threads_in_use
                                    .load(Ordering::Relaxed),
                                Ordering::Relaxed,
                            );
                            done_in_inner.fetch_add(1, Ordering::Relaxed);
                        },
                        ScheduleFlags::MAY_RECURSE,
                    )
                    .unwrap();
            },
            ScheduleFlags::empty(),
        )
        .unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        done.load(Ordering::Relaxed) == 1
    }));

    // The nested frame must not bump the in-use count a second time.
    assert_eq!(outer_in_use.load(Ordering::Relaxed), 1);
    assert_eq!(inner_in_use.load(Ordering::Relaxed), 1);

    executor.shutdown(Duration::from_secs(5)).unwrap();
}

#[test]
fn may_recurse_from_a_non_worker_thread_is_posted() {
    let executor = recursion_executor(8);
    executor.start().unwrap();

    let ran = Arc::new(AtomicUsize::new(0));
    let ran_on = Arc::new(Mutex::new(None));
    let ran_in_task = Arc::clone(&ran);
    let ran_on_in_task = Arc::clone(&ran_on);
    executor
        .schedule(
            move || {
                *ran_on_in_task.lock() = Some(std::thread::current().id());
                ran_in_task.fetch_add(1, Ordering::Relaxed);
            },
            ScheduleFlags::MAY_RECURSE,
        )
        .unwrap();

    assert!(wait_until(Duration::from_secs(2), || {
        ran.load(Ordering::Relaxed) == 1
    }));

    // Posted, never inline on the admitting non-worker thread.
    let ran_on = ran_on.lock().unwrap();
    assert_ne!(ran_on, std::thread::current().id());

    executor.shutdown(Duration::from_secs(5)).unwrap();
}
