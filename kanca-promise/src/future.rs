//! The consumer end.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::error::PromiseError;
use crate::state::SharedState;

/// The consumer end of a one-shot result channel.
///
/// Dropping the future counts as cancellation: the producer's completion
/// thunk will find no consumer and deliver nothing.
pub struct Future<R: Send + 'static> {
    state: Option<Arc<SharedState<R>>>,
    canceller: Option<Box<dyn FnOnce()>>,
}

impl<R: Send + 'static> Future<R> {
    pub(crate) fn new(state: Arc<SharedState<R>>, canceller: Option<Box<dyn FnOnce()>>) -> Self {
        state.has_future.store(true, Ordering::Release);
        Self {
            state: Some(state),
            canceller,
        }
    }

    /// Installs the completion callback and returns the future for
    /// chaining.
    ///
    /// The callback receives `Some(result)` on completion or `None` when
    /// the producer died first. Fails with `NoState` on a cancelled future
    /// and with `CallbackAlreadySet` on a second installation.
    pub fn then<F>(self, f: F) -> Result<Self, PromiseError>
    where
        F: Fn(Option<R>) + Send + Sync + 'static,
    {
        let state = self.state.as_ref().ok_or(PromiseError::NoState)?;
        if !state.set_callback_if_empty(Arc::new(f)) {
            return Err(PromiseError::CallbackAlreadySet);
        }
        Ok(self)
    }

    /// Withdraws interest in the result and runs the canceller, if any.
    ///
    /// Idempotent; also performed on drop. A completion thunk that is
    /// already scheduled observes the withdrawal at execution time and
    /// skips the callback.
    pub fn cancel(&mut self) {
        if let Some(state) = self.state.take() {
            state.has_future.store(false, Ordering::Release);
        }
        if let Some(canceller) = self.canceller.take() {
            canceller();
        }
    }

    /// `true` from creation until the producer calls `finished`, the
    /// producer dies, or this future is cancelled.
    pub fn is_active(&self) -> bool {
        self.state.as_ref().is_some_and(|state| state.is_active())
    }

    pub(crate) fn into_parts(
        mut self,
    ) -> (Option<Arc<SharedState<R>>>, Option<Box<dyn FnOnce()>>) {
        (self.state.take(), self.canceller.take())
    }
}

impl<R: Send + 'static> Drop for Future<R> {
    fn drop(&mut self) {
        self.cancel();
    }
}
