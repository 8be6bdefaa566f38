//! The deadline-ordered task timer.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use kanca_promise::Task;

/// Injectable monotonic clock; tests substitute a manually advanced one.
pub type Clock = Arc<dyn Fn() -> Instant + Send + Sync>;

/// Shared state of the timer thread.
///
/// The map is the deadline-ordered multimap: tasks due at the same instant
/// queue up in their bucket in insertion order, which is also their firing
/// order.
pub(crate) struct TimerCtx {
    pending: Mutex<BTreeMap<Instant, Vec<Task>>>,
    stopped: AtomicBool,
    now: Clock,
}

impl TimerCtx {
    pub(crate) fn new(now: Clock) -> Arc<Self> {
        Arc::new(Self {
            pending: Mutex::new(BTreeMap::new()),
            stopped: AtomicBool::new(false),
            now,
        })
    }

    pub(crate) fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub(crate) fn schedule_in(&self, delay: Duration, task: Task) {
        self.schedule_at((*self.now)() + delay, task);
    }

    pub(crate) fn schedule_at(&self, when: Instant, task: Task) {
        self.pending
            .lock()
            .unwrap()
            .entry(when)
            .or_default()
            .push(task);
    }

    /// The timer thread body: wake every `resolution`, move everything due
    /// out from under the lock, then run it in deadline order. A task
    /// scheduled for `D` fires no earlier than the first clock observation
    /// at or past `D`, and no later than one resolution after it.
    pub(crate) fn run(ctx: Arc<Self>, resolution: Duration) {
        let mut due: Vec<Task> = Vec::new();
        while !ctx.stopped.load(Ordering::Relaxed) {
            thread::sleep(resolution);
            {
                let mut pending = ctx.pending.lock().unwrap();
                if pending.is_empty() {
                    continue;
                }
                let now = (*ctx.now)();
                while let Some(entry) = pending.first_entry() {
                    if *entry.key() > now {
                        break;
                    }
                    due.extend(entry.remove());
                }
            }
            // Tasks run outside the lock; they may schedule again.
            for task in due.drain(..) {
                task();
            }
        }
    }
}
