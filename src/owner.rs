//! The owner side of the callback lifetime protocol.

use std::cell::Cell;
use std::sync::Arc;

use crossbeam_utils::Backoff;

use crate::callback::Callback;
use crate::error::CallbackError;
use crate::flags::CallbackId;
use crate::token::{detached_core, OwnerCore, PendingGuard};

/// Issues callbacks whose right to run ends with this object.
///
/// `N` is the number of flag slots, i.e. how many *tracked* callbacks (those
/// with a [`CallbackId`]) may be alive at once; untracked callbacks are
/// unlimited. All callbacks issued by one owner must execute on the owner's
/// thread.
///
/// Dropping the owner cancels every outstanding callback in one step and
/// returns only once no in-flight invocation still holds a liveness guard,
/// so the cancellation is observable synchronously.
pub struct Owner<const N: usize = 128> {
    core: Arc<OwnerCore>,
    cursor: Cell<usize>,
}

impl<const N: usize> Owner<N> {
    /// Tracked callbacks alive at the same time, at most.
    pub const CAPACITY: usize = N;

    /// Creates an owner with a fresh liveness token.
    pub fn new() -> Self {
        Self {
            core: OwnerCore::new(N),
            cursor: Cell::new(0),
        }
    }

    /// Binds `f` to this owner.
    ///
    /// The callback is silenced by the owner's death or by
    /// [`invalidate_all`](Self::invalidate_all); it occupies no flag slot
    /// and cannot be cancelled individually.
    pub fn callback<A, F>(&self, f: F) -> Callback<A>
    where
        F: Fn(A) + 'static,
    {
        Callback::new(Arc::downgrade(&self.core), Some(Box::new(f)), None)
    }

    /// Binds `f` and writes an id for individual cancellation into `id`.
    ///
    /// Fails with `CapacityExceeded` when all `N` flag slots are taken;
    /// dropping any tracked callback frees its slot again.
    pub fn tracked_callback<A, F>(
        &self,
        f: F,
        id: &mut CallbackId,
    ) -> Result<Callback<A>, CallbackError>
    where
        F: Fn(A) + 'static,
    {
        let (index, generation) = self.core.flags().allocate(&self.cursor)?;
        *id = CallbackId::pack(index, generation);
        Ok(Callback::new(
            Arc::downgrade(&self.core),
            Some(Box::new(f)),
            Some(index),
        ))
    }

    /// A tracked callback with no function: invoking it does nothing, but
    /// its id reports liveness like any other tracked callback.
    pub fn empty_callback(&self, id: &mut CallbackId) -> Result<Callback<()>, CallbackError> {
        let (index, generation) = self.core.flags().allocate(&self.cursor)?;
        *id = CallbackId::pack(index, generation);
        Ok(Callback::new(Arc::downgrade(&self.core), None, Some(index)))
    }

    /// Wraps `f` into a plain closure that no-ops once the owner is dead.
    ///
    /// Unlike [`callback`](Self::callback) the result is an ordinary `Fn`
    /// value; it occupies no flag slot and cannot be cancelled individually.
    /// The closure holds its liveness guard across the call, so an owner
    /// dropped on another thread waits for an in-flight wrapped call to
    /// return.
    pub fn wrap<A, F>(&self, f: F) -> impl Fn(A)
    where
        F: Fn(A),
    {
        let guard = PendingGuard::new(&self.core);
        move |arg| {
            if let Some(_live) = guard.hold() {
                f(arg);
            }
        }
    }

    /// Binds `f` to the process-wide immortal token; the callback outlives
    /// this owner and is never cancelled.
    pub fn detached_callback<A, F>(&self, f: F) -> Callback<A>
    where
        F: Fn(A) + 'static,
    {
        Callback::new(detached_core(), Some(Box::new(f)), None)
    }

    /// Cancels the callback `id` refers to and empties the id.
    ///
    /// Stale ids (from a slot recycled since) are a no-op.
    pub fn cancel(&self, id: &mut CallbackId) {
        if let Some((index, generation)) = id.unpack() {
            self.core.flags().cancel(index, generation);
        }
        id.clear();
    }

    /// Returns `true` while the callback object behind `id` exists and has
    /// not been cancelled. Empties the id once it observes otherwise.
    pub fn is_active(&self, id: &mut CallbackId) -> bool {
        let active = match id.unpack() {
            Some((index, generation)) => self.core.flags().is_active(index, generation),
            None => false,
        };
        if !active {
            id.clear();
        }
        active
    }

    /// Cancels every callback issued so far in one step.
    ///
    /// The owner swaps its token for a fresh one; callbacks created
    /// afterwards are unaffected.
    pub fn invalidate_all(&mut self) {
        self.core = OwnerCore::new(N);
        self.cursor.set(0);
    }

    /// Returns `true` while any callback or wrapped closure issued by this
    /// owner is still alive.
    pub fn has_pending_callbacks(&self) -> bool {
        self.core.pending_count() > 0
    }
}

impl<const N: usize> Default for Owner<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Drop for Owner<N> {
    fn drop(&mut self) {
        // Quiescence: wait until no invocation holds an upgraded liveness
        // guard. Same-thread invocations released theirs before running user
        // code, so dropping the owner from inside one of its own callbacks
        // terminates.
        let backoff = Backoff::new();
        while Arc::strong_count(&self.core) > 1 {
            backoff.snooze();
        }
    }
}
