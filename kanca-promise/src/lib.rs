//! Callback-style promises over pluggable executors.
//!
//! A [`Promise`] is the producer end of a one-shot result channel; the
//! [`Future`] it hands out is the consumer end. Instead of being polled, the
//! future registers a completion callback with [`Future::then`], and the
//! promise delivers through an [`Executor`] of the user's choosing: a thread
//! pool, an event loop, or a plain queue drained by hand.
//!
//! # Key Features
//!
//! - **No dangling listeners**: a completion thunk re-checks at run time
//!   that the future still exists before invoking the callback
//! - **Abandonment signalling**: dropping an unfinished promise delivers
//!   `None` to the listener
//! - **Cancellation**: cancelling (or dropping) a future withdraws interest
//!   and runs an optional canceller wired by the producer
//! - **Combinators**: [`and`] completes when both inputs have completed,
//!   [`or`] when the first does, cancelling the loser
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use std::collections::VecDeque;
//! use kanca_promise::{embed_promise_into_task, Executor, Promise, Task};
//!
//! let queue: Arc<Mutex<VecDeque<Task>>> = Arc::new(Mutex::new(VecDeque::new()));
//! let executor: Executor = {
//!     let queue = Arc::clone(&queue);
//!     Arc::new(move |task| queue.lock().unwrap().push_back(task))
//! };
//!
//! let promise = Promise::new(executor);
//! let result = Arc::new(Mutex::new(None));
//! let sink = Arc::clone(&result);
//! let _future = promise
//!     .get_future()
//!     .unwrap()
//!     .then(move |r: Option<u32>| *sink.lock().unwrap() = r)
//!     .unwrap();
//!
//! queue
//!     .lock()
//!     .unwrap()
//!     .push_back(Box::new(embed_promise_into_task(promise, || 42)));
//! loop {
//!     // The lock is released before the task runs; tasks may enqueue more.
//!     let task = queue.lock().unwrap().pop_front();
//!     match task {
//!         Some(task) => task(),
//!         None => break,
//!     }
//! }
//! assert_eq!(*result.lock().unwrap(), Some(42));
//! ```

#![warn(missing_docs)]

mod combine;
mod error;
mod future;
mod promise;
mod state;
mod task;

pub use combine::{and, or, Empty};
pub use error::PromiseError;
pub use future::Future;
pub use promise::Promise;
pub use task::{embed_promise_into_task, Executor, Task};
