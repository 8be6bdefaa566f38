//! A single-thread worker with a deadline-ordered, bounded task queue.

use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use kanca_promise::Task;

use crate::util::panic_message;

/// Receives `(worker_name, panic_message)` when a task panics.
pub type PanicHandler = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// Runtime knobs of a [`Worker`].
#[derive(Clone)]
pub struct WorkerConfig {
    /// Name reported to the panic handler.
    pub name: String,
    /// Backpressure bound: `schedule` blocks while this many tasks wait.
    pub capacity: usize,
    /// Invoked on the worker thread when a task panics.
    pub panic_handler: Option<PanicHandler>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            capacity: 16,
            panic_handler: None,
        }
    }
}

struct Queue {
    tasks: BTreeMap<Instant, VecDeque<Task>>,
    len: usize,
}

struct Shared {
    name: String,
    capacity: usize,
    panic_handler: Option<PanicHandler>,
    stop: AtomicBool,
    queue: Mutex<Queue>,
    filled: Condvar,
    emptied: Condvar,
}

impl Shared {
    fn run(shared: Arc<Shared>) {
        while !shared.stop.load(Ordering::Relaxed) {
            let task = shared.next_task();
            shared.emptied.notify_one();
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                if let Some(handler) = shared.panic_handler.as_deref() {
                    handler(
                        &shared.name,
                        panic_message(payload.as_ref()).unwrap_or("unknown"),
                    );
                }
            }
        }
    }

    /// Blocks until the earliest deadline is due, then pops one task.
    /// Re-reads the head after every wait: a later submission may be due
    /// sooner than the one we went to sleep over.
    fn next_task(&self) -> Task {
        let mut queue = self.queue.lock().unwrap();
        loop {
            while queue.tasks.is_empty() {
                queue = self.filled.wait(queue).unwrap();
            }
            let head = *queue.tasks.keys().next().unwrap();
            let now = Instant::now();
            if head > now {
                let (reacquired, _) = self.filled.wait_timeout(queue, head - now).unwrap();
                queue = reacquired;
                continue;
            }
            let mut entry = queue.tasks.first_entry().unwrap();
            let task = entry.get_mut().pop_front().unwrap();
            if entry.get().is_empty() {
                entry.remove();
            }
            queue.len -= 1;
            return task;
        }
    }
}

/// One thread draining a deadline-ordered task queue.
///
/// Immediate and delayed tasks share the queue; a task scheduled with a
/// delay runs once its deadline passes, after any earlier-deadline work.
/// Equal deadlines run in submission order. The queue is bounded:
/// [`schedule`](Self::schedule) blocks while it is full, the `try_` variants
/// refuse instead. Dropping the worker runs everything already due, then
/// joins the thread.
pub struct Worker {
    shared: Arc<Shared>,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    /// Spawns the worker thread.
    pub fn new(config: WorkerConfig) -> Self {
        assert!(config.capacity >= 1, "worker needs queue capacity");
        let shared = Arc::new(Shared {
            name: config.name,
            capacity: config.capacity,
            panic_handler: config.panic_handler,
            stop: AtomicBool::new(false),
            queue: Mutex::new(Queue {
                tasks: BTreeMap::new(),
                len: 0,
            }),
            filled: Condvar::new(),
            emptied: Condvar::new(),
        });
        let runner = Arc::clone(&shared);
        let thread = thread::spawn(move || Shared::run(runner));
        Self {
            shared,
            thread: Some(thread),
        }
    }

    /// Schedules `f` for immediate execution; blocks while the queue is
    /// full.
    pub fn schedule<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.schedule_in(Duration::ZERO, f);
    }

    /// As [`schedule`](Self::schedule), but returns `false` instead of
    /// blocking when the queue is full.
    pub fn try_schedule<F>(&self, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        self.try_schedule_in(Duration::ZERO, f)
    }

    /// Schedules `f` to run `delay` from now; blocks while the queue is
    /// full.
    pub fn schedule_in<F>(&self, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let when = Instant::now() + delay;
        {
            let mut queue = self.shared.queue.lock().unwrap();
            while queue.len >= self.shared.capacity {
                queue = self.shared.emptied.wait(queue).unwrap();
            }
            queue.tasks.entry(when).or_default().push_back(Box::new(f));
            queue.len += 1;
        }
        self.shared.filled.notify_one();
    }

    /// As [`schedule_in`](Self::schedule_in), but returns `false` instead
    /// of blocking when the queue is full.
    pub fn try_schedule_in<F>(&self, delay: Duration, f: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let when = Instant::now() + delay;
        {
            let mut queue = self.shared.queue.lock().unwrap();
            if queue.len >= self.shared.capacity {
                return false;
            }
            queue.tasks.entry(when).or_default().push_back(Box::new(f));
            queue.len += 1;
        }
        self.shared.filled.notify_one();
        true
    }
}

impl Drop for Worker {
    /// Sends a stop marker through the queue and joins the thread: work
    /// already due still runs before the worker exits.
    fn drop(&mut self) {
        let shared = Arc::clone(&self.shared);
        self.schedule(move || shared.stop.store(true, Ordering::Relaxed));
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}
