//! Owner-gated function objects.

use std::sync::Weak;

use crate::token::OwnerCore;

pub(crate) type BoxedFn<A> = Box<dyn Fn(A)>;

/// A callable tied to the lifetime of the [`Owner`](crate::Owner) that made
/// it.
///
/// Invoking a callback is a silent no-op once the owner has died, once the
/// owner invalidated its callbacks, or once this callback's slot was
/// cancelled individually. Callbacks are not one-shot by default; see
/// [`invoke_oneshot`](Self::invoke_oneshot).
///
/// Moving a callback transfers its flag reservation; dropping it releases
/// the slot for reuse.
pub struct Callback<A = ()> {
    core: Weak<OwnerCore>,
    func: Option<BoxedFn<A>>,
    flag: Option<usize>,
}

impl<A> Callback<A> {
    pub(crate) fn new(core: Weak<OwnerCore>, func: Option<BoxedFn<A>>, flag: Option<usize>) -> Self {
        if let Some(live) = core.upgrade() {
            live.add_pending();
        }
        Self { core, func, flag }
    }

    /// Runs the stored function unless the callback is cancelled.
    pub fn invoke(&self, arg: A) {
        let Some(func) = self.func.as_ref() else {
            return;
        };
        {
            let Some(core) = self.core.upgrade() else {
                return;
            };
            core.assert_owner_thread();
            if let Some(index) = self.flag {
                if core.flags().is_cancelled(index) {
                    return;
                }
            }
            // Liveness guard released here, before user code runs: the
            // function may drop its own owner without deadlocking the
            // owner's quiescence spin.
        }
        func(arg);
    }

    /// Invokes, then forgets the stored function. Later invocations no-op.
    pub fn invoke_oneshot(&mut self, arg: A) {
        self.invoke(arg);
        self.func = None;
    }

    /// Returns `true` when invoking would be a no-op because the owner died
    /// or the slot was cancelled.
    pub fn is_cancelled(&self) -> bool {
        match self.core.upgrade() {
            Some(core) => match self.flag {
                Some(index) => core.flags().is_cancelled(index),
                None => false,
            },
            None => true,
        }
    }

    /// Returns `true` while the issuing owner is alive.
    pub fn is_owner_alive(&self) -> bool {
        self.core.upgrade().is_some()
    }

    pub(crate) fn take_func(&mut self) -> Option<BoxedFn<A>> {
        self.func.take()
    }

    pub(crate) fn set_func(&mut self, func: BoxedFn<A>) {
        self.func = Some(func);
    }
}

impl<A> Drop for Callback<A> {
    fn drop(&mut self) {
        if let Some(core) = self.core.upgrade() {
            if let Some(index) = self.flag {
                core.flags().deactivate(index);
            }
            core.remove_pending();
        }
    }
}

/// Defers a callback through an executor.
///
/// A callback already cancelled at scheduling time is dropped without
/// touching the executor; one cancelled between scheduling and execution
/// no-ops when the thunk runs.
pub fn schedule<A, X>(executor: X, callback: Callback<A>, arg: A)
where
    A: 'static,
    X: FnOnce(Box<dyn FnOnce()>),
{
    if callback.is_cancelled() {
        return;
    }
    executor(Box::new(move || callback.invoke(arg)));
}
