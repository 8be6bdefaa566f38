//! Kanca: lifetime-bound callbacks with cancellation and completion tracking.
//!
//! An [`Owner`] issues function objects ([`Callback`]s) whose right to run
//! ends with the owner: once the owner is dropped, or once
//! [`Owner::invalidate_all`] is called, every outstanding callback turns into
//! a silent no-op. Individual callbacks can additionally be cancelled through
//! a compact generational [`CallbackId`].
//!
//! # Key Features
//!
//! - **Cancel-on-drop**: callbacks never execute against a destroyed owner
//! - **Granular cancellation**: O(1) per-callback cancel via 32-bit ids
//! - **Bulk cancellation**: one-step invalidation of every issued callback
//! - **Completion synchronizers**: [`AllOf`] / [`AnyOf`] listeners over N
//!   callbacks
//! - **Executor-friendly**: [`schedule`] defers a callback through any
//!   executor while keeping it cancellable up to the moment it runs
//!
//! # Example
//!
//! ```rust
//! use kanca::Owner;
//!
//! let owner: Owner = Owner::new();
//! let cb = owner.callback(|n: u32| println!("got {}", n));
//!
//! cb.invoke(7); // runs
//! drop(owner);
//! // `cb` is now cancelled; invoking it would be a silent no-op
//! ```

#![warn(missing_docs)]

mod callback;
mod error;
mod flags;
mod owner;
mod sync;
mod token;

pub use callback::{schedule, Callback};
pub use error::CallbackError;
pub use flags::CallbackId;
pub use owner::Owner;
pub use sync::{AllOf, AnyOf};
