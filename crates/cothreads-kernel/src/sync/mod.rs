//! Synchronization primitives built on [`park`](crate::park).

pub mod semaphore;
pub mod wait_queue;

pub use semaphore::{Acquire, Semaphore};
pub use wait_queue::WaitQueue;
