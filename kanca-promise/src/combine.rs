//! Future combinators.

use std::ops::{BitAnd, BitOr};
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::future::Future;
use crate::state::SharedState;

/// Result type of combined futures; carries no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Empty;

/// Flips the combined state inactive and delivers `Some(Empty)` to its
/// listener. The swap makes completion idempotent: when both children
/// complete in the same executor turn, only the first observer fires.
fn complete(combined: &Arc<SharedState<Empty>>) {
    if combined.active.swap(false, Ordering::AcqRel) {
        if combined.has_future() {
            if let Some(cb) = combined.callback() {
                (*cb)(Some(Empty));
            }
        }
    }
}

/// Chains a hook onto `child`'s completion: the child's previously
/// installed callback still runs with its own result, then the combined
/// state completes once `other` is observed inactive as well.
fn chain_and<R, O>(
    child: &Arc<SharedState<R>>,
    other: &Arc<SharedState<O>>,
    combined: &Arc<SharedState<Empty>>,
) where
    R: Send + 'static,
    O: Send + 'static,
{
    let prev = child.callback();
    let other = Arc::clone(other);
    let combined = Arc::clone(combined);
    child.set_callback(Arc::new(move |r: Option<R>| {
        if let Some(cb) = prev.as_deref() {
            cb(r);
        }
        if !other.is_active() {
            complete(&combined);
        }
    }));
}

/// Chains a hook onto `child`'s completion: the loser (`other`) is
/// cancelled first, the child's previous callback still runs, then the
/// combined state completes.
fn chain_or<R, O>(
    child: &Arc<SharedState<R>>,
    other: &Arc<SharedState<O>>,
    combined: &Arc<SharedState<Empty>>,
) where
    R: Send + 'static,
    O: Send + 'static,
{
    let prev = child.callback();
    let other = Arc::clone(other);
    let combined = Arc::clone(combined);
    child.set_callback(Arc::new(move |r: Option<R>| {
        other.has_future.store(false, Ordering::Release);
        if let Some(cb) = prev.as_deref() {
            cb(r);
        }
        complete(&combined);
    }));
}

/// A canceller that withdraws interest from both children and runs their
/// own cancellers.
fn fan_out_canceller<R1, R2>(
    lhs: Option<Arc<SharedState<R1>>>,
    rhs: Option<Arc<SharedState<R2>>>,
    lhs_canceller: Option<Box<dyn FnOnce()>>,
    rhs_canceller: Option<Box<dyn FnOnce()>>,
) -> Box<dyn FnOnce()>
where
    R1: Send + 'static,
    R2: Send + 'static,
{
    Box::new(move || {
        if let Some(state) = &lhs {
            state.has_future.store(false, Ordering::Release);
        }
        if let Some(state) = &rhs {
            state.has_future.store(false, Ordering::Release);
        }
        if let Some(canceller) = lhs_canceller {
            canceller();
        }
        if let Some(canceller) = rhs_canceller {
            canceller();
        }
    })
}

/// Combines two futures into one that completes when **both** have
/// completed.
///
/// Each child's previously installed callback is preserved and still called
/// with that child's own result. The combined listener receives
/// `Some(Empty)` exactly once, after the later completion. Cancelling the
/// combined future cancels both children.
pub fn and<R1, R2>(lhs: Future<R1>, rhs: Future<R2>) -> Future<Empty>
where
    R1: Send + 'static,
    R2: Send + 'static,
{
    let (lhs_state, lhs_canceller) = lhs.into_parts();
    let (rhs_state, rhs_canceller) = rhs.into_parts();

    let combined = SharedState::<Empty>::new(
        lhs_state.as_ref().is_some_and(|state| state.is_active())
            && rhs_state.as_ref().is_some_and(|state| state.is_active()),
    );

    if let (Some(lhs), Some(rhs)) = (&lhs_state, &rhs_state) {
        chain_and(lhs, rhs, &combined);
        chain_and(rhs, lhs, &combined);
    }

    let canceller = fan_out_canceller(lhs_state, rhs_state, lhs_canceller, rhs_canceller);
    Future::new(combined, Some(canceller))
}

/// Combines two futures into one that completes when the **first** child
/// does; the other child is cancelled.
///
/// The winner's previously installed callback still runs with its result;
/// the loser's never does (its producer observes the withdrawal). The
/// combined listener receives `Some(Empty)` exactly once.
pub fn or<R1, R2>(lhs: Future<R1>, rhs: Future<R2>) -> Future<Empty>
where
    R1: Send + 'static,
    R2: Send + 'static,
{
    let (lhs_state, lhs_canceller) = lhs.into_parts();
    let (rhs_state, rhs_canceller) = rhs.into_parts();

    let combined = SharedState::<Empty>::new(
        lhs_state.as_ref().is_some_and(|state| state.is_active())
            && rhs_state.as_ref().is_some_and(|state| state.is_active()),
    );

    if let (Some(lhs), Some(rhs)) = (&lhs_state, &rhs_state) {
        chain_or(lhs, rhs, &combined);
        chain_or(rhs, lhs, &combined);
    }

    let canceller = fan_out_canceller(lhs_state, rhs_state, lhs_canceller, rhs_canceller);
    Future::new(combined, Some(canceller))
}

impl<R1, R2> BitAnd<Future<R2>> for Future<R1>
where
    R1: Send + 'static,
    R2: Send + 'static,
{
    type Output = Future<Empty>;

    /// `f1 & f2` is [`and`]`(f1, f2)`.
    fn bitand(self, rhs: Future<R2>) -> Future<Empty> {
        and(self, rhs)
    }
}

impl<R1, R2> BitOr<Future<R2>> for Future<R1>
where
    R1: Send + 'static,
    R2: Send + 'static,
{
    type Output = Future<Empty>;

    /// `f1 | f2` is [`or`]`(f1, f2)`.
    fn bitor(self, rhs: Future<R2>) -> Future<Empty> {
        or(self, rhs)
    }
}
