//! The producer end.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::error::PromiseError;
use crate::future::Future;
use crate::state::SharedState;
use crate::task::Executor;

/// The producer end of a one-shot result channel.
///
/// Completion and abandonment are both delivered asynchronously through the
/// executor the promise was built with, never inline.
pub struct Promise<R: Send + 'static> {
    executor: Executor,
    state: Arc<SharedState<R>>,
}

impl<R: Send + 'static> Promise<R> {
    /// Creates an unfulfilled promise delivering through `executor`.
    pub fn new(executor: Executor) -> Self {
        Self {
            executor,
            state: SharedState::new(true),
        }
    }

    /// Hands out the consumer end. Fails with `AlreadyHasFuture` on a
    /// second call.
    pub fn get_future(&self) -> Result<Future<R>, PromiseError> {
        if self.state.has_future() {
            return Err(PromiseError::AlreadyHasFuture);
        }
        Ok(Future::new(Arc::clone(&self.state), None))
    }

    /// As [`get_future`](Self::get_future), wiring a canceller that the
    /// future runs when it is cancelled or dropped. Producers use it to
    /// abandon work nobody is waiting for any more.
    pub fn get_future_with_canceller<C>(&self, canceller: C) -> Result<Future<R>, PromiseError>
    where
        C: FnOnce() + 'static,
    {
        if self.state.has_future() {
            return Err(PromiseError::AlreadyHasFuture);
        }
        Ok(Future::new(
            Arc::clone(&self.state),
            Some(Box::new(canceller)),
        ))
    }

    /// Delivers the result.
    ///
    /// The registered callback, if any, is scheduled through the executor;
    /// the scheduled thunk re-checks at execution time that the consumer
    /// still exists before invoking `cb(Some(r))`. Fails with
    /// `AlreadyFinished` on a second delivery.
    pub fn finished(&self, r: R) -> Result<(), PromiseError> {
        if !self.state.active.swap(false, Ordering::AcqRel) {
            return Err(PromiseError::AlreadyFinished);
        }
        if self.state.has_future() {
            if let Some(cb) = self.state.callback() {
                let state = Arc::clone(&self.state);
                (*self.executor)(Box::new(move || {
                    if state.has_future() {
                        (*cb)(Some(r));
                    }
                }));
            }
        }
        Ok(())
    }

    /// Returns `true` when no consumer is interested in the result any
    /// more: either no future was ever taken, or it has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        !self.state.has_future()
    }
}

impl<R: Send + 'static> Drop for Promise<R> {
    /// Abandonment: a promise dying before delivery signals the listener
    /// with `None`, through the executor like any completion.
    fn drop(&mut self) {
        if !self.state.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if self.state.has_future() {
            if let Some(cb) = self.state.callback() {
                let state = Arc::clone(&self.state);
                (*self.executor)(Box::new(move || {
                    if state.has_future() {
                        (*cb)(None);
                    }
                }));
            }
        }
    }
}
