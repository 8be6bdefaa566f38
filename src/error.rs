use std::error::Error;
use std::fmt;

/// Typed errors for owner and synchronizer operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackError {
    /// Every flag slot is taken; the owner cannot track another callback.
    CapacityExceeded,
    /// The synchronizer is disengaged and cannot track callbacks.
    InvalidState,
}

impl fmt::Display for CallbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackError::CapacityExceeded => {
                write!(f, "Number of callbacks exceeds owner capacity")
            }
            CallbackError::InvalidState => write!(f, "Synchronizer is in invalid state"),
        }
    }
}

impl Error for CallbackError {}
