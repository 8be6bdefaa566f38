//! The shared core that ties an owner to its callbacks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread::{self, ThreadId};

use once_cell::sync::Lazy;

use crate::flags::FlagSet;

/// Shared between one owner and every callback it issued.
///
/// The owner holds the only long-lived strong reference; callbacks hold weak
/// ones and upgrade briefly to prove the owner alive. The owner's drop waits
/// for those upgrades to drain, which makes its death observable
/// synchronously: once drop returns, every callback sees a dead owner.
pub(crate) struct OwnerCore {
    flags: FlagSet,
    pending: AtomicU64,
    thread: Option<ThreadId>,
}

impl OwnerCore {
    pub(crate) fn new(capacity: usize) -> Arc<Self> {
        Arc::new(Self {
            flags: FlagSet::new(capacity),
            pending: AtomicU64::new(0),
            thread: Some(thread::current().id()),
        })
    }

    pub(crate) fn flags(&self) -> &FlagSet {
        &self.flags
    }

    pub(crate) fn add_pending(&self) {
        self.pending.fetch_add(1, Ordering::AcqRel);
    }

    pub(crate) fn remove_pending(&self) {
        self.pending.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn pending_count(&self) -> u64 {
        self.pending.load(Ordering::Acquire)
    }

    /// Callbacks and their owner share one thread; invocation checks it.
    pub(crate) fn assert_owner_thread(&self) {
        if let Some(owner) = self.thread {
            debug_assert_eq!(
                owner,
                thread::current().id(),
                "callback invoked off its owner's thread"
            );
        }
    }
}

/// The immortal core backing detached callbacks. Its strong reference lives
/// in a process-wide static, so upgrades never fail and detached callbacks
/// are never cancelled.
pub(crate) fn detached_core() -> Weak<OwnerCore> {
    static DETACHED: Lazy<Arc<OwnerCore>> = Lazy::new(|| {
        Arc::new(OwnerCore {
            flags: FlagSet::new(0),
            pending: AtomicU64::new(0),
            thread: None,
        })
    });
    Arc::downgrade(&DETACHED)
}

/// Counts one outstanding wrapped closure on the core and releases the count
/// when the closure dies. Holding the upgrade across the wrapped call keeps
/// the owner's drop from completing mid-invocation on another thread.
pub(crate) struct PendingGuard {
    core: Weak<OwnerCore>,
}

impl PendingGuard {
    pub(crate) fn new(core: &Arc<OwnerCore>) -> Self {
        core.add_pending();
        Self {
            core: Arc::downgrade(core),
        }
    }

    pub(crate) fn hold(&self) -> Option<Arc<OwnerCore>> {
        self.core.upgrade()
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if let Some(core) = self.core.upgrade() {
            core.remove_pending();
        }
    }
}
