//! Counting semaphore.
//!
//! Built only from [`park`] and a private [`WaitQueue`].  `release` prefers
//! handing its unit straight to the longest waiter over incrementing the
//! counter, so a waiter is never left parked while a unit is free:
//!
//! ```text
//! acquire:  units > 0  ->  units -= 1, continue
//!           units == 0 ->  park on waiters
//! release:  waiters    ->  hand off front waiter (units untouched)
//!           no waiters ->  units += 1
//! ```
//!
//! A unit handed to a waiter belongs to that waiter even before it runs
//! again.  If its [`Acquire`] future is dropped in between (the scheduler
//! that owned the thread went away), the unit is released again rather than
//! lost.
//!
//! There is no try-acquire, no timeout and no priority among waiters.

use std::cell::Cell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::suspend::{Park, park};
use crate::sync::wait_queue::WaitQueue;

/// A counting semaphore for cooperative threads.
///
/// Share it between threads with an `Rc`.  It is not tied to any scheduler:
/// a hand-off returns the waiter to the ready queue of whichever scheduler
/// parked it.
pub struct Semaphore {
    units: Cell<usize>,
    waiters: WaitQueue,
}

impl Semaphore {
    /// Create a semaphore holding `units` free units.
    #[must_use]
    pub fn new(units: usize) -> Self {
        Self {
            units: Cell::new(units),
            waiters: WaitQueue::new(),
        }
    }

    /// Take one unit, parking the calling thread if none is free.
    ///
    /// Returns without suspending when a unit is available.
    pub fn acquire(&self) -> Acquire<'_> {
        Acquire {
            semaphore: self,
            park: None,
            done: false,
        }
    }

    /// Return one unit, or give it directly to the longest waiter.
    pub fn release(&self) {
        if !self.waiters.unpark_one() {
            self.units.set(self.units.get() + 1);
        }
        self.check_invariant();
    }

    /// Units currently free.
    pub fn available_units(&self) -> usize {
        self.units.get()
    }

    /// Threads currently parked on this semaphore.
    pub fn waiting(&self) -> usize {
        self.waiters.len()
    }

    fn check_invariant(&self) {
        debug_assert!(
            self.waiters.is_empty() || self.units.get() == 0,
            "semaphore has {} free units with {} parked waiters",
            self.units.get(),
            self.waiters.len()
        );
    }
}

/// Future returned by [`Semaphore::acquire`].
#[must_use = "futures do nothing unless awaited"]
pub struct Acquire<'a> {
    semaphore: &'a Semaphore,
    park: Option<Park<'a>>,
    /// The unit has been delivered to the caller.
    done: bool,
}

impl Future for Acquire<'_> {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(());
        }
        let semaphore = this.semaphore;
        if this.park.is_none() {
            let units = semaphore.units.get();
            if units > 0 {
                semaphore.units.set(units - 1);
                semaphore.check_invariant();
                this.done = true;
                return Poll::Ready(());
            }
        }
        let parked = this.park.get_or_insert_with(|| park(&semaphore.waiters));
        let poll = Pin::new(parked).poll(cx);
        if poll.is_ready() {
            this.done = true;
        }
        poll
    }
}

impl Drop for Acquire<'_> {
    fn drop(&mut self) {
        // A hand-off that never reached its owner goes to the next waiter.
        if !self.done && self.park.as_ref().is_some_and(|park| park.is_handed_off()) {
            tracing::debug!("acquire dropped after hand-off, releasing its unit");
            self.semaphore.release();
        }
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("units", &self.units.get())
            .field("waiting", &self.waiters.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::pin;
    use std::task::{Context, Poll};

    use futures::future::FutureExt;
    use futures::task::noop_waker;

    #[test]
    fn uncontended_round_trip_keeps_units() {
        let sem = Semaphore::new(2);
        // Completes on the first poll.
        assert!(sem.acquire().now_or_never().is_some());
        assert_eq!(sem.available_units(), 1);
        sem.release();
        assert_eq!(sem.available_units(), 2);
        assert_eq!(sem.waiting(), 0);
    }

    #[test]
    fn release_without_waiters_adds_a_unit() {
        let sem = Semaphore::new(0);
        sem.release();
        assert_eq!(sem.available_units(), 1);
    }

    #[test]
    fn release_hands_off_to_waiter() {
        let sem = Semaphore::new(0);
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut acquire = pin!(sem.acquire());
        assert_eq!(acquire.as_mut().poll(&mut cx), Poll::Pending);
        assert_eq!(sem.waiting(), 1);
        assert_eq!(sem.available_units(), 0);

        sem.release();
        assert_eq!(sem.waiting(), 0);
        assert_eq!(sem.available_units(), 0, "hand-off bypasses the counter");
        assert_eq!(acquire.as_mut().poll(&mut cx), Poll::Ready(()));
    }

    #[test]
    fn dropped_hand_off_returns_unit() {
        let sem = Semaphore::new(0);
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut acquire = Box::pin(sem.acquire());
        assert_eq!(acquire.as_mut().poll(&mut cx), Poll::Pending);
        sem.release();
        drop(acquire);

        assert_eq!(sem.available_units(), 1);
        assert_eq!(sem.waiting(), 0);
    }

    #[test]
    fn dropped_hand_off_passes_to_next_waiter() {
        let sem = Semaphore::new(0);
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut first = Box::pin(sem.acquire());
        let mut second = Box::pin(sem.acquire());
        assert_eq!(first.as_mut().poll(&mut cx), Poll::Pending);
        assert_eq!(second.as_mut().poll(&mut cx), Poll::Pending);
        assert_eq!(sem.waiting(), 2);

        sem.release();
        drop(first);

        assert_eq!(sem.waiting(), 0);
        assert_eq!(sem.available_units(), 0);
        assert_eq!(second.as_mut().poll(&mut cx), Poll::Ready(()));
    }

    #[test]
    fn dropped_waiter_before_hand_off_keeps_units() {
        let sem = Semaphore::new(0);
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut acquire = Box::pin(sem.acquire());
        assert_eq!(acquire.as_mut().poll(&mut cx), Poll::Pending);
        drop(acquire);
        assert_eq!(sem.waiting(), 0);
        assert_eq!(sem.available_units(), 0);

        sem.release();
        assert_eq!(sem.available_units(), 1);
    }

    #[test]
    fn completed_acquire_does_not_release_on_drop() {
        let sem = Semaphore::new(0);
        let waker = noop_waker();
        let mut cx = Context::from_waker(&waker);

        let mut acquire = Box::pin(sem.acquire());
        assert_eq!(acquire.as_mut().poll(&mut cx), Poll::Pending);
        sem.release();
        assert_eq!(acquire.as_mut().poll(&mut cx), Poll::Ready(()));
        drop(acquire);
        assert_eq!(sem.available_units(), 0);
    }

    #[test]
    fn debug_shows_state() {
        let sem = Semaphore::new(3);
        assert_eq!(format!("{sem:?}"), "Semaphore { units: 3, waiting: 0 }");
    }
}
