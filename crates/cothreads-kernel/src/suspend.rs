//! Suspension points.
//!
//! Both primitives capture the calling thread through the waker of the
//! context they are polled with, which the scheduler sets to the thread's
//! continuation.  Awaiting them anywhere other than inside a kernel thread
//! hands the suspension to whatever executor is polling instead; the kernel
//! neither detects nor supports that.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use crate::sync::wait_queue::{WaitQueue, Waiter};

/// Cede the current turn: go to the back of the ready queue.
pub fn yield_now() -> YieldNow {
    YieldNow { yielded: false }
}

/// Future returned by [`yield_now`].
#[derive(Debug)]
#[must_use = "futures do nothing unless awaited"]
pub struct YieldNow {
    yielded: bool,
}

impl Future for YieldNow {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.yielded {
            return Poll::Ready(());
        }
        self.yielded = true;
        cx.waker().wake_by_ref();
        Poll::Pending
    }
}

/// Suspend the current thread on `queue` until it is handed off with
/// [`WaitQueue::unpark_one`].
///
/// Building block for synchronization primitives; a parked thread with no
/// matching hand-off never runs again.
pub fn park(queue: &WaitQueue) -> Park<'_> {
    Park {
        queue,
        waiter: None,
    }
}

/// Future returned by [`park`].
#[must_use = "futures do nothing unless awaited"]
pub struct Park<'a> {
    queue: &'a WaitQueue,
    waiter: Option<Rc<Waiter>>,
}

impl Park<'_> {
    /// `true` once `unpark_one` picked this park, whether or not it has been
    /// polled to completion since.
    pub(crate) fn is_handed_off(&self) -> bool {
        self.waiter.as_ref().is_some_and(|waiter| waiter.is_unparked())
    }
}

impl Future for Park<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if let Some(waiter) = &this.waiter {
            if waiter.is_unparked() {
                return Poll::Ready(());
            }
            // Spurious poll: still parked.
            waiter.refresh(cx.waker());
            return Poll::Pending;
        }
        this.waiter = Some(this.queue.push(cx.waker().clone()));
        Poll::Pending
    }
}

impl Drop for Park<'_> {
    fn drop(&mut self) {
        if let Some(waiter) = &self.waiter {
            if !waiter.is_unparked() {
                self.queue.withdraw(waiter);
            }
        }
    }
}
