//! Completion synchronizers over groups of callbacks.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::callback::Callback;
use crate::error::CallbackError;

/// Bias added to the tracked count while the synchronizer object is alive.
/// Removed on drop; also the bound on how many callbacks can be tracked.
const SENTINEL: u32 = 10_000;

struct SyncState {
    tracked: Cell<u32>,
    fired: Cell<u32>,
    listener: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl SyncState {
    fn new(listener: Box<dyn FnOnce()>) -> Rc<Self> {
        Rc::new(Self {
            tracked: Cell::new(SENTINEL),
            fired: Cell::new(0),
            listener: RefCell::new(Some(listener)),
        })
    }

    fn fire_listener(&self) {
        // Take the listener out before calling: no borrow is held across
        // user code.
        let listener = self.listener.borrow_mut().take();
        if let Some(listener) = listener {
            listener();
        }
    }

    fn detach(&self) {
        debug_assert!(self.tracked.get() >= SENTINEL);
        self.tracked.set(self.tracked.get() - SENTINEL);
    }
}

/// Wraps the callback's function with a once-per-callback firing hook.
fn hook_callback<A, F>(state: &Rc<SyncState>, cb: &mut Callback<A>, on_fire: F)
where
    A: 'static,
    F: Fn(&SyncState) + 'static,
{
    state.tracked.set(state.tracked.get() + 1);
    let prev = cb.take_func();
    let hook = Cell::new(Some(Rc::clone(state)));
    cb.set_func(Box::new(move |arg: A| {
        if let Some(func) = prev.as_ref() {
            func(arg);
        }
        // Repeated invocations of the same callback count once.
        let Some(state) = hook.take() else {
            return;
        };
        state.fired.set(state.fired.get() + 1);
        on_fire(&state);
    }));
}

/// Fires its listener once **all** tracked callbacks have run and the
/// synchronizer itself has been dropped, whichever happens last.
///
/// Tracks up to 10 000 callbacks. Not thread-safe: every tracked callback
/// must execute on the thread the synchronizer lives on.
pub struct AllOf {
    state: Option<Rc<SyncState>>,
}

impl AllOf {
    /// Creates a synchronizer that will run `listener` exactly once.
    pub fn new<F>(listener: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            state: Some(SyncState::new(Box::new(listener))),
        }
    }

    /// Hooks the callback so its first invocation counts towards completion.
    ///
    /// Must be called before the callback fires. Fails with `InvalidState`
    /// on a disengaged synchronizer.
    pub fn track<A: 'static>(&self, cb: &mut Callback<A>) -> Result<(), CallbackError> {
        let state = self.state.as_ref().ok_or(CallbackError::InvalidState)?;
        hook_callback(state, cb, |state| {
            if state.fired.get() == state.tracked.get() {
                state.fire_listener();
            }
        });
        Ok(())
    }

    /// [`track`](Self::track)s and returns the callback, for inline use.
    pub fn tracked<A: 'static>(&self, mut cb: Callback<A>) -> Result<Callback<A>, CallbackError> {
        self.track(&mut cb)?;
        Ok(cb)
    }
}

impl Default for AllOf {
    /// A disengaged synchronizer; [`track`](Self::track) fails until a real
    /// one is assigned over it.
    fn default() -> Self {
        Self { state: None }
    }
}

impl Drop for AllOf {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        state.detach();
        if state.fired.get() == state.tracked.get() {
            state.fire_listener();
        }
    }
}

/// Fires its listener once **one** of the tracked callbacks has run and the
/// synchronizer itself has been dropped, whichever happens last.
///
/// The listener fires at most once, and only if at least one tracked
/// callback actually ran. Tracks up to 10 000 callbacks. Not thread-safe.
pub struct AnyOf {
    state: Option<Rc<SyncState>>,
}

impl AnyOf {
    /// Creates a synchronizer that will run `listener` at most once.
    pub fn new<F>(listener: F) -> Self
    where
        F: FnOnce() + 'static,
    {
        Self {
            state: Some(SyncState::new(Box::new(listener))),
        }
    }

    /// Hooks the callback so its first invocation counts as completion.
    ///
    /// Must be called before the callback fires. Fails with `InvalidState`
    /// on a disengaged synchronizer.
    pub fn track<A: 'static>(&self, cb: &mut Callback<A>) -> Result<(), CallbackError> {
        let state = self.state.as_ref().ok_or(CallbackError::InvalidState)?;
        hook_callback(state, cb, |state| {
            // Fires only after detach; before that the drop handler owns
            // the decision.
            if state.fired.get() == 1 && state.tracked.get() < SENTINEL {
                state.fire_listener();
            }
        });
        Ok(())
    }

    /// [`track`](Self::track)s and returns the callback, for inline use.
    pub fn tracked<A: 'static>(&self, mut cb: Callback<A>) -> Result<Callback<A>, CallbackError> {
        self.track(&mut cb)?;
        Ok(cb)
    }
}

impl Default for AnyOf {
    /// A disengaged synchronizer; [`track`](Self::track) fails until a real
    /// one is assigned over it.
    fn default() -> Self {
        Self { state: None }
    }
}

impl Drop for AnyOf {
    fn drop(&mut self) {
        let Some(state) = self.state.take() else {
            return;
        };
        state.detach();
        if state.fired.get() > 0 {
            state.fire_listener();
        }
    }
}
