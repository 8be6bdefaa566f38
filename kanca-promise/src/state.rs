//! State shared between one producer and at most one consumer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

pub(crate) type ResultCallback<R> = Arc<dyn Fn(Option<R>) + Send + Sync>;

/// `active` starts `true` and transitions to `false` exactly once, when the
/// producer finishes or dies. `has_future` tracks whether a consumer is
/// still interested; completion thunks re-read it at execution time, which
/// is the only thing protecting the listener after cancellation.
pub(crate) struct SharedState<R> {
    pub(crate) has_future: AtomicBool,
    pub(crate) active: AtomicBool,
    on_finished: RwLock<Option<ResultCallback<R>>>,
}

impl<R> SharedState<R> {
    pub(crate) fn new(active: bool) -> Arc<Self> {
        Arc::new(Self {
            has_future: AtomicBool::new(false),
            active: AtomicBool::new(active),
            on_finished: RwLock::new(None),
        })
    }

    /// Clones the callback handle out under the read lock; the callback is
    /// never invoked while the lock is held.
    pub(crate) fn callback(&self) -> Option<ResultCallback<R>> {
        self.on_finished.read().unwrap().clone()
    }

    /// Unconditional overwrite, used by combinators to chain through a
    /// previously installed callback.
    pub(crate) fn set_callback(&self, cb: ResultCallback<R>) {
        *self.on_finished.write().unwrap() = Some(cb);
    }

    /// The only publication path after the future is built: installs `cb`
    /// unless a callback is already present.
    pub(crate) fn set_callback_if_empty(&self, cb: ResultCallback<R>) -> bool {
        let mut slot = self.on_finished.write().unwrap();
        if slot.is_some() {
            return false;
        }
        *slot = Some(cb);
        true
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    pub(crate) fn has_future(&self) -> bool {
        self.has_future.load(Ordering::Acquire)
    }
}
