//! The executor contract.

use std::sync::Arc;

use crate::promise::Promise;

/// A unit of deferred work.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs submitted tasks somewhere, sometime.
///
/// Completion delivery assumes tasks submitted to one executor run FIFO
/// relative to each other; nothing is assumed across distinct executors or
/// across pool worker threads.
pub type Executor = Arc<dyn Fn(Task) + Send + Sync + 'static>;

/// Couples a promise with the work that fulfils it.
///
/// The returned task checks at run time whether a consumer still exists: a
/// cancelled promise neither runs `f` nor delivers. This is what lets an
/// `or` combinator's loser be enqueued and later skipped entirely.
pub fn embed_promise_into_task<R, F>(promise: Promise<R>, f: F) -> impl FnOnce()
where
    R: Send + 'static,
    F: FnOnce() -> R,
{
    move || {
        if !promise.is_cancelled() {
            promise
                .finished(f())
                .expect("embedded task promise delivered twice");
        }
    }
}
