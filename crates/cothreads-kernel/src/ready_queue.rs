//! The ready queue.
//!
//! An ordered collection of threads waiting for their next turn.  Insertion
//! order is scheduling order: there is no priority, no deduplication and no
//! reordering.  The queue holds [`ThreadId`]s only; the suspended state each
//! id stands for lives in the scheduler's thread table.
//!
//! The backing store is a [`crossbeam::queue::SegQueue`] shared through an
//! `Arc`, because [`Waker`](std::task::Waker)s must be `Send + Sync` and every
//! waker pushes onto this queue.

use std::sync::Arc;

use crossbeam::queue::SegQueue;

use crate::thread::ThreadId;

/// Strict FIFO of runnable threads.  Cloning yields another handle to the
/// same queue.
#[derive(Clone, Default)]
pub struct ReadyQueue {
    inner: Arc<SegQueue<ThreadId>>,
}

impl ReadyQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `id` to the back of the queue.
    pub fn enqueue(&self, id: ThreadId) {
        self.inner.push(id);
    }

    /// Remove and return the front of the queue, or `None` if it is empty.
    pub fn dequeue(&self) -> Option<ThreadId> {
        self.inner.pop()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl std::fmt::Debug for ReadyQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadyQueue")
            .field("len", &self.len())
            .finish()
    }
}
