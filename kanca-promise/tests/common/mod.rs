use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use kanca_promise::{Executor, Task};

/// A manually drained task queue standing in for a real executor.
pub struct TaskQueue {
    tasks: Mutex<VecDeque<Task>>,
}

impl TaskQueue {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            tasks: Mutex::new(VecDeque::new()),
        })
    }

    pub fn executor(self: &Arc<Self>) -> Executor {
        let queue = Arc::clone(self);
        Arc::new(move |task| queue.tasks.lock().unwrap().push_back(task))
    }

    pub fn enqueue(&self, task: impl FnOnce() + Send + 'static) {
        self.tasks.lock().unwrap().push_back(Box::new(task));
    }

    /// Runs up to `count` tasks; each runs outside the lock, so tasks may
    /// enqueue follow-ups.
    pub fn process(&self, count: usize) -> usize {
        let mut processed = 0;
        while processed < count {
            let task = self.tasks.lock().unwrap().pop_front();
            match task {
                Some(task) => {
                    task();
                    processed += 1;
                }
                None => break,
            }
        }
        processed
    }

    pub fn process_all(&self) -> usize {
        self.process(usize::MAX)
    }

    /// Drops every queued task. The drops run outside the lock: a dying
    /// promise may enqueue its abandonment notice while we are clearing.
    pub fn clear(&self) {
        let drained: Vec<Task> = {
            let mut tasks = self.tasks.lock().unwrap();
            tasks.drain(..).collect()
        };
        drop(drained);
    }
}

/// Records every delivery made to a completion callback.
pub struct CallLog<R> {
    calls: Mutex<Vec<Option<R>>>,
}

impl<R: Clone> CallLog<R> {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
        })
    }

    pub fn sink(self: &Arc<Self>) -> impl Fn(Option<R>) + Send + Sync + 'static
    where
        R: Send + 'static,
    {
        let log = Arc::clone(self);
        move |r| log.calls.lock().unwrap().push(r)
    }

    pub fn calls(&self) -> Vec<Option<R>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}
