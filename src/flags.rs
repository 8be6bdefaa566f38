//! Generational liveness flags for tracked callbacks.
//!
//! Every tracked callback claims one atomic byte in its owner's registry:
//!
//! ```text
//! +---+---+-----------+
//! | A | C |   ID:6    |
//! +---+---+-----------+
//!  bit7 bit6  bits 0-5
//! ```
//!
//! `A` is set while the callback object exists, `C` when the slot has been
//! cancelled explicitly, and `ID` is a generation counter bumped on every
//! activation so a recycled slot invalidates ids handed out for its previous
//! occupant.

use std::cell::Cell;
use std::sync::atomic::{AtomicU8, Ordering};

use crate::error::CallbackError;

const MASK_ALIVE: u8 = 1 << 7;
const MASK_CANCELLED: u8 = 1 << 6;
const ID_BITS: u32 = 6;
const MASK_ID: u8 = (1 << ID_BITS) - 1;

/// Identifies one tracked callback within the owner that issued it.
///
/// The raw value packs the registry index with the slot's generation at
/// allocation time (`index << 6 | generation`), so a recycled slot makes old
/// ids stale. The generation wraps after 64 reuses of a slot; to keep
/// wraparound aliasing rare, an id empties itself as soon as its owner
/// observes the operation inactive or cancelled.
#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
pub struct CallbackId {
    raw: Option<u32>,
}

impl CallbackId {
    pub(crate) fn pack(index: usize, generation: u8) -> Self {
        Self {
            raw: Some((index as u32) << ID_BITS | u32::from(generation)),
        }
    }

    pub(crate) fn unpack(&self) -> Option<(usize, u8)> {
        self.raw
            .map(|raw| ((raw >> ID_BITS) as usize, (raw as u8) & MASK_ID))
    }

    pub(crate) fn clear(&mut self) {
        self.raw = None;
    }

    /// Returns `true` if the id no longer refers to any callback.
    pub fn is_empty(&self) -> bool {
        self.raw.is_none()
    }
}

/// Fixed-capacity registry of callback liveness flags.
///
/// Only the issuing owner's thread mutates flags; other threads at most read
/// cancellation state, so byte-wide atomic loads and RMWs are all the
/// synchronization this needs.
pub(crate) struct FlagSet {
    flags: Box<[AtomicU8]>,
}

impl FlagSet {
    pub(crate) fn new(capacity: usize) -> Self {
        let mut flags = Vec::with_capacity(capacity);
        flags.resize_with(capacity, || AtomicU8::new(0));
        Self {
            flags: flags.into_boxed_slice(),
        }
    }

    /// Claims a free slot, scanning round-robin from the cursor.
    ///
    /// Activation bumps the slot generation, sets `A` and clears `C` in one
    /// published store. Fails with `CapacityExceeded` when a full sweep finds
    /// no slot with `A == 0`.
    pub(crate) fn allocate(&self, cursor: &Cell<usize>) -> Result<(usize, u8), CallbackError> {
        if self.flags.is_empty() {
            return Err(CallbackError::CapacityExceeded);
        }
        for _ in 0..self.flags.len() {
            let index = (cursor.get() + 1) % self.flags.len();
            cursor.set(index);
            let flag = &self.flags[index];
            let current = flag.load(Ordering::Acquire);
            if current & MASK_ALIVE == 0 {
                let generation = current.wrapping_add(1) & MASK_ID;
                flag.store(MASK_ALIVE | generation, Ordering::Release);
                return Ok((index, generation));
            }
        }
        Err(CallbackError::CapacityExceeded)
    }

    pub(crate) fn deactivate(&self, index: usize) {
        self.flags[index].fetch_and(!MASK_ALIVE, Ordering::AcqRel);
    }

    /// Marks the slot cancelled if `generation` still matches; stale ids are
    /// a no-op.
    pub(crate) fn cancel(&self, index: usize, generation: u8) {
        let flag = &self.flags[index];
        if flag.load(Ordering::Acquire) & MASK_ID == generation {
            flag.fetch_or(MASK_CANCELLED, Ordering::AcqRel);
        }
    }

    pub(crate) fn is_active(&self, index: usize, generation: u8) -> bool {
        let value = self.flags[index].load(Ordering::Acquire);
        value & MASK_ID == generation && value & MASK_ALIVE != 0 && value & MASK_CANCELLED == 0
    }

    pub(crate) fn is_cancelled(&self, index: usize) -> bool {
        self.flags[index].load(Ordering::Acquire) & MASK_CANCELLED != 0
    }
}
