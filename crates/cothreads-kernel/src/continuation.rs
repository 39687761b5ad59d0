//! One-shot resume handles.
//!
//! A suspended thread is represented by its [`Continuation`]: the thread id
//! plus the ready queue it goes back to.  Suspension primitives never see the
//! continuation directly; they receive it as the [`Waker`](std::task::Waker)
//! of the current [`Context`](std::task::Context), so `wake()` *is* "resume
//! this thread".
//!
//! The `queued` flag keeps the handle one-shot: between two resumptions a
//! thread can be placed on the ready queue once, no matter how many times its
//! waker fires.  A finished thread is retired by leaving the flag set forever.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::task::ArcWake;

use crate::ready_queue::ReadyQueue;
use crate::thread::ThreadId;

pub(crate) struct Continuation {
    thread: ThreadId,
    ready: ReadyQueue,
    queued: AtomicBool,
}

impl Continuation {
    pub(crate) fn new(thread: ThreadId, ready: ReadyQueue) -> Arc<Self> {
        Arc::new(Self {
            thread,
            ready,
            queued: AtomicBool::new(false),
        })
    }

    /// Put the thread on the ready queue unless it is already there.
    /// Returns `true` if this call enqueued it.
    pub(crate) fn schedule(&self) -> bool {
        if self.queued.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.ready.enqueue(self.thread);
        true
    }

    /// Consume the pending resumption.  Called by the scheduler right before
    /// it polls the thread, so that a suspension during this poll can
    /// schedule it again.
    pub(crate) fn consume(&self) {
        self.queued.store(false, Ordering::Release);
    }

    /// Whether the thread asked to be resumed (i.e. yielded rather than
    /// parked) during its last poll.
    pub(crate) fn is_queued(&self) -> bool {
        self.queued.load(Ordering::Acquire)
    }

    /// Make every future wake a no-op.
    pub(crate) fn retire(&self) {
        self.queued.store(true, Ordering::Release);
    }
}

impl ArcWake for Continuation {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        if !arc_self.schedule() {
            tracing::trace!(thread_id = %arc_self.thread, "redundant wake ignored");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::task::waker;

    fn fixture() -> (ReadyQueue, Arc<Continuation>) {
        let ready = ReadyQueue::new();
        let cont = Continuation::new(ThreadId::from_raw(1), ready.clone());
        (ready, cont)
    }

    #[test]
    fn wake_enqueues_once() {
        let (ready, cont) = fixture();
        let w = waker(Arc::clone(&cont));
        w.wake_by_ref();
        w.wake_by_ref();
        assert_eq!(ready.len(), 1);
        assert!(cont.is_queued());
    }

    #[test]
    fn consume_rearms_the_handle() {
        let (ready, cont) = fixture();
        assert!(cont.schedule());
        assert_eq!(ready.dequeue(), Some(ThreadId::from_raw(1)));
        cont.consume();
        assert!(!cont.is_queued());
        assert!(cont.schedule());
        assert_eq!(ready.len(), 1);
    }

    #[test]
    fn retired_continuation_ignores_wakes() {
        let (ready, cont) = fixture();
        cont.retire();
        waker(Arc::clone(&cont)).wake();
        assert!(ready.is_empty());
    }
}
