//! Elastic worker pool with an integrated delayed-task timer.
//!
//! [`WorkerPool`] feeds `min_size..=max_size` worker threads from one
//! bounded MPMC queue. Mandatory workers live as long as the pool; optional
//! ones are spawned when a submission finds every worker busy and exit again
//! after `max_linger` without work. Delayed submissions go through a timer
//! thread that polls a deadline-ordered multimap at a fixed resolution and
//! feeds due tasks back into the queue.
//!
//! The crate also ships [`Worker`], a single-thread variant with its own
//! deadline queue and blocking backpressure.
//!
//! # Key Features
//!
//! - **Elastic sizing**: grows under load, shrinks after idling
//! - **Panic isolation**: a panicking task is logged, the worker survives
//! - **Delayed execution**: `execute_in` / `execute_at` with a bounded
//!   lateness of one timer resolution
//! - **Injectable clock**: deterministic timer tests without sleeping
//! - **Executor bridge**: [`WorkerPool::executor`] plugs the pool into
//!   `kanca-promise` promises
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use kanca_pool::{PoolConfig, WorkerPool};
//!
//! let pool = WorkerPool::new(
//!     PoolConfig::default(),
//!     Arc::new(|line| eprintln!("{}", line)),
//! );
//! pool.execute(|| println!("now"));
//! pool.execute_in(Duration::from_millis(10), || println!("later"));
//! ```

#![warn(missing_docs)]

mod pool;
mod timer;
mod util;
mod worker;

pub use kanca_promise::{Executor, Task};
pub use pool::{Logger, PoolConfig, WorkerPool};
pub use timer::Clock;
pub use worker::{PanicHandler, Worker, WorkerConfig};
