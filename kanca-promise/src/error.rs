use std::error::Error;
use std::fmt;

/// Typed errors for promise/future API misuse.
///
/// These surface synchronously from API calls, never from inside a scheduled
/// completion thunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromiseError {
    /// The future no longer carries shared state (it was cancelled).
    NoState,
    /// The promise has already delivered its result.
    AlreadyFinished,
    /// A future has already been handed out for this promise.
    AlreadyHasFuture,
    /// A completion callback is already installed on this future.
    CallbackAlreadySet,
}

impl fmt::Display for PromiseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromiseError::NoState => write!(f, "No state"),
            PromiseError::AlreadyFinished => write!(f, "Async task already finished"),
            PromiseError::AlreadyHasFuture => write!(f, "Future already exists"),
            PromiseError::CallbackAlreadySet => write!(f, "Async callback already set"),
        }
    }
}

impl Error for PromiseError {}
