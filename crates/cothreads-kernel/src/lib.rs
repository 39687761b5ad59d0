//! Cooperative threading kernel.
//!
//! Many logical threads share one OS thread and switch only at explicit
//! suspension points:
//!
//! - **[`scheduler`]** -- [`Scheduler`] owns the ready queue and the thread
//!   table, and resumes threads in strict FIFO order until none is runnable.
//! - **[`thread`]** -- thread ids, lifecycle states and metadata snapshots.
//! - **[`suspend`]** -- [`yield_now`] (back of the ready queue) and [`park`]
//!   (onto a caller-supplied [`WaitQueue`]).
//! - **[`sync`]** -- [`Semaphore`], built only from `park` and hand-off.
//! - **[`config`]** -- [`KernelConfig`] and the [`FailurePolicy`] for bodies
//!   that fail.
//! - **[`error`]** -- unified kernel error types via [`thiserror`].
//!
//! A thread body is any `'static` future returning `()` or `Result<(), E>`.
//!
//! ```
//! use std::rc::Rc;
//! use cothreads_kernel::{Scheduler, Semaphore, yield_now};
//!
//! let scheduler = Scheduler::new();
//! let sem = Rc::new(Semaphore::new(1));
//! for name in ["a", "b"] {
//!     let sem = Rc::clone(&sem);
//!     scheduler.spawn(name, async move {
//!         sem.acquire().await;
//!         yield_now().await;
//!         sem.release();
//!     });
//! }
//! let summary = scheduler.run().unwrap();
//! assert_eq!(summary.completed, 2);
//! ```
//!
//! Polling [`yield_now`] or [`park`] outside a kernel thread, or resuming a
//! thread by hand, is outside the contract.  Parked threads that nobody wakes
//! are not an error: `run()` returns and lists them in
//! [`RunSummary::blocked`].

pub mod config;
pub mod error;
pub mod ready_queue;
pub mod scheduler;
pub mod suspend;
pub mod sync;
pub mod thread;

mod continuation;

// Re-export the most commonly used types at the crate root for convenience.
pub use config::{FailurePolicy, KernelConfig};
pub use error::{KernelError, Result};
pub use ready_queue::ReadyQueue;
pub use scheduler::{Handle, RunSummary, Scheduler};
pub use suspend::{Park, YieldNow, park, yield_now};
pub use sync::{Acquire, Semaphore, WaitQueue};
pub use thread::{ThreadId, ThreadInfo, ThreadOutcome, ThreadStatus};
