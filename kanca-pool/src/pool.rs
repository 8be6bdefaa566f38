//! The elastic worker pool.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use crossbeam_utils::Backoff;
use kanca_promise::{Executor, Task};

use crate::timer::{Clock, TimerCtx};
use crate::util::panic_message;

/// Thread-safe sink for worker diagnostics.
pub type Logger = Arc<dyn Fn(String) + Send + Sync>;

/// Runtime knobs of a [`WorkerPool`].
#[derive(Clone)]
pub struct PoolConfig {
    /// Mandatory workers, spawned at construction and kept until shutdown.
    pub min_size: usize,
    /// Ceiling on concurrently live workers; also the queue capacity.
    pub max_size: usize,
    /// Idle time after which an optional worker exits.
    pub max_linger: Duration,
    /// Poll period of the integrated timer.
    pub timer_resolution: Duration,
    /// Whether dropping the pool waits for every worker to exit.
    pub join_threads: bool,
    /// Whether worker threads survive panicking tasks.
    pub catch_panics: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size: 2,
            max_size: 5,
            max_linger: Duration::from_secs(10),
            timer_resolution: Duration::from_millis(100),
            join_threads: true,
            catch_panics: true,
        }
    }
}

struct WorkerCtx {
    tx: Sender<Task>,
    rx: Receiver<Task>,
    logger: Logger,
    stopped: AtomicBool,
    worker_count: AtomicU32,
    busy_count: AtomicU32,
    max_size: usize,
    max_linger: Duration,
    catch_panics: bool,
}

impl WorkerCtx {
    /// Blocks while the queue is full: submission backpressure. Sending
    /// cannot fail while `self` also holds the receiver.
    fn enqueue(&self, task: Task) {
        let _ = self.tx.send(task);
    }

    /// Enqueues, growing the pool by one optional worker when every live
    /// worker is busy and the ceiling allows it.
    fn execute(self: &Arc<Self>, task: Task) {
        self.enqueue(task);
        let workers = self.worker_count.load(Ordering::Acquire);
        if workers < self.max_size as u32 && workers == self.busy_count.load(Ordering::Acquire) {
            let ctx = Arc::clone(self);
            thread::spawn(move || WorkerCtx::run_optional(ctx));
        }
    }

    fn run_mandatory(ctx: Arc<Self>) {
        ctx.worker_count.fetch_add(1, Ordering::AcqRel);
        while !ctx.stopped.load(Ordering::Relaxed) {
            match ctx.rx.recv() {
                Ok(task) => ctx.invoke_guarded(task),
                Err(_) => break,
            }
        }
        ctx.worker_count.fetch_sub(1, Ordering::AcqRel);
    }

    fn run_optional(ctx: Arc<Self>) {
        ctx.worker_count.fetch_add(1, Ordering::AcqRel);
        while !ctx.stopped.load(Ordering::Relaxed) {
            match ctx.rx.recv_timeout(ctx.max_linger) {
                Ok(task) => ctx.invoke_guarded(task),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }
        ctx.worker_count.fetch_sub(1, Ordering::AcqRel);
    }

    fn invoke_guarded(&self, task: Task) {
        self.busy_count.fetch_add(1, Ordering::AcqRel);
        if self.catch_panics {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                let thread_id = thread::current().id();
                let line = match panic_message(payload.as_ref()) {
                    Some(what) => {
                        format!("Uncaught exception in thread {:?}: {}", thread_id, what)
                    }
                    None => format!("Uncaught exception in thread {:?}", thread_id),
                };
                (*self.logger)(line);
            }
        } else {
            task();
        }
        self.busy_count.fetch_sub(1, Ordering::AcqRel);
    }
}

/// An auto-scaling pool of worker threads fed by one bounded MPMC queue,
/// with an integrated timer for delayed work.
///
/// The pool keeps `min_size` mandatory workers alive for its whole
/// lifetime. A submission that finds every worker busy spawns an optional
/// worker, up to `max_size`; optional workers exit after `max_linger`
/// without work. Tasks on distinct workers run concurrently and without any
/// ordering between them.
pub struct WorkerPool {
    ctx: Arc<WorkerCtx>,
    timer: Arc<TimerCtx>,
    join_threads: bool,
}

impl WorkerPool {
    /// Creates a pool on the real clock.
    pub fn new(config: PoolConfig, logger: Logger) -> Self {
        Self::with_clock(config, logger, Arc::new(Instant::now))
    }

    /// Creates a pool observing deadlines through `now`. Tests substitute a
    /// manually advanced clock to drive the timer deterministically.
    pub fn with_clock(config: PoolConfig, logger: Logger, now: Clock) -> Self {
        assert!(config.min_size >= 1, "pool needs a mandatory worker");
        assert!(config.max_size >= config.min_size);

        let (tx, rx) = bounded(config.max_size);
        let ctx = Arc::new(WorkerCtx {
            tx,
            rx,
            logger,
            stopped: AtomicBool::new(false),
            worker_count: AtomicU32::new(0),
            busy_count: AtomicU32::new(0),
            max_size: config.max_size,
            max_linger: config.max_linger,
            catch_panics: config.catch_panics,
        });
        for _ in 0..config.min_size {
            let ctx = Arc::clone(&ctx);
            thread::spawn(move || WorkerCtx::run_mandatory(ctx));
        }

        let timer = TimerCtx::new(now);
        {
            let timer = Arc::clone(&timer);
            let resolution = config.timer_resolution;
            thread::spawn(move || TimerCtx::run(timer, resolution));
        }

        Self {
            ctx,
            timer,
            join_threads: config.join_threads,
        }
    }

    /// Runs `f` as soon as a worker is free. Blocks while the queue is
    /// full.
    pub fn execute<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.ctx.execute(Box::new(f));
    }

    /// Runs `f` no earlier than `delay` from now, with at most one timer
    /// resolution of extra lateness. When due, the task is enqueued to the
    /// workers; it never runs on the timer thread.
    pub fn execute_in<F>(&self, delay: Duration, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let ctx = Arc::clone(&self.ctx);
        self.timer
            .schedule_in(delay, Box::new(move || ctx.enqueue(Box::new(f))));
    }

    /// Runs `f` no earlier than `when`, with at most one timer resolution
    /// of extra lateness.
    pub fn execute_at<F>(&self, when: Instant, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let ctx = Arc::clone(&self.ctx);
        self.timer
            .schedule_at(when, Box::new(move || ctx.enqueue(Box::new(f))));
    }

    /// An [`Executor`] feeding this pool; hand it to promises.
    pub fn executor(&self) -> Executor {
        let ctx = Arc::clone(&self.ctx);
        Arc::new(move |task| ctx.execute(task))
    }

    /// Number of live workers, mandatory and optional.
    pub fn worker_count(&self) -> usize {
        self.ctx.worker_count.load(Ordering::Acquire) as usize
    }
}

impl Drop for WorkerPool {
    /// Stops the timer and the workers, wakes blocked dequeues with no-op
    /// tasks, and, when configured, waits until the last worker has exited.
    fn drop(&mut self) {
        self.timer.stop();
        self.ctx.stopped.store(true, Ordering::Relaxed);
        for _ in 0..self.ctx.worker_count.load(Ordering::Acquire) {
            let _ = self.ctx.tx.try_send(Box::new(|| {}));
        }
        if self.join_threads {
            let backoff = Backoff::new();
            while self.ctx.worker_count.load(Ordering::Acquire) > 0 {
                backoff.snooze();
            }
        }
    }
}
