//! Private wait queues for synchronization primitives.
//!
//! A [`WaitQueue`] is the non-ready counterpart of the ready queue: threads
//! that [`park`](crate::park) on it stay suspended until someone calls
//! [`WaitQueue::unpark_one`], which hands the front waiter over to the ready
//! queue.  Order is strict FIFO.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;
use std::task::Waker;

/// A parked thread as seen from the queue.
pub(crate) struct Waiter {
    waker: RefCell<Waker>,
    unparked: Cell<bool>,
}

impl Waiter {
    pub(crate) fn is_unparked(&self) -> bool {
        self.unparked.get()
    }

    pub(crate) fn refresh(&self, waker: &Waker) {
        let mut current = self.waker.borrow_mut();
        if !current.will_wake(waker) {
            *current = waker.clone();
        }
    }
}

/// FIFO of parked threads.
#[derive(Default)]
pub struct WaitQueue {
    waiters: RefCell<VecDeque<Rc<Waiter>>>,
}

impl WaitQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of threads currently parked here.
    pub fn len(&self) -> usize {
        self.waiters.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.waiters.borrow().is_empty()
    }

    /// Move the longest-waiting thread to the ready queue.
    ///
    /// Returns `false` if nobody was parked.
    pub fn unpark_one(&self) -> bool {
        let Some(waiter) = self.waiters.borrow_mut().pop_front() else {
            return false;
        };
        waiter.unparked.set(true);
        waiter.waker.borrow().wake_by_ref();
        true
    }

    pub(crate) fn push(&self, waker: Waker) -> Rc<Waiter> {
        let waiter = Rc::new(Waiter {
            waker: RefCell::new(waker),
            unparked: Cell::new(false),
        });
        self.waiters.borrow_mut().push_back(Rc::clone(&waiter));
        waiter
    }

    /// Remove a waiter whose park future was dropped before being unparked.
    pub(crate) fn withdraw(&self, waiter: &Rc<Waiter>) {
        self.waiters
            .borrow_mut()
            .retain(|queued| !Rc::ptr_eq(queued, waiter));
    }
}

impl fmt::Debug for WaitQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaitQueue")
            .field("len", &self.len())
            .finish()
    }
}
