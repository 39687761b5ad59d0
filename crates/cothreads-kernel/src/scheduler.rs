//! Cooperative FIFO scheduler.
//!
//! The scheduler owns a [`ReadyQueue`] and a table of suspended threads.
//! [`Scheduler::run`] repeatedly dequeues the front thread and resumes it on
//! the calling OS thread; control comes back only when that thread yields,
//! parks or ends.  The loop stops when the ready queue is empty.
//!
//! # Termination
//!
//! An empty ready queue means either that every thread finished or that the
//! remaining ones are parked with nobody left to wake them.  Both return
//! `Ok`; the [`RunSummary`] tells them apart through
//! [`RunSummary::blocked`].  Parked threads are never resumed or dropped by
//! `run()`; they are released when the scheduler itself is dropped.
//!
//! # Failures
//!
//! A body that returns `Err` or panics ends its thread.  What happens next
//! depends on [`FailurePolicy`]: `Propagate` stops `run()` with
//! [`KernelError::ThreadFailed`]; `LogAndContinue` records the error and
//! keeps scheduling.
//!
//! # Threading
//!
//! `Scheduler` is neither `Send` nor `Sync`.  All kernel state is pinned to
//! the OS thread that created it, which is what makes the unsynchronized
//! interior mutability here sound.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::task::Poll;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::{FailurePolicy, KernelConfig};
use crate::continuation::Continuation;
use crate::error::{KernelError, Result};
use crate::ready_queue::ReadyQueue;
use crate::thread::{self, Thread, ThreadId, ThreadInfo, ThreadOutcome, ThreadStatus};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// What one call to [`Scheduler::run`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// The scheduler instance that produced this summary.
    pub kernel_id: Uuid,
    /// Number of resumptions performed.
    pub resumes: u64,
    /// Threads that finished successfully during this run.
    pub completed: u64,
    /// Threads that failed during this run (only non-zero under
    /// [`FailurePolicy::LogAndContinue`]).
    pub failed: u64,
    /// Threads left parked when the ready queue ran dry, in id order.
    pub blocked: Vec<ThreadId>,
}

impl RunSummary {
    fn new(kernel_id: Uuid) -> Self {
        Self {
            kernel_id,
            resumes: 0,
            completed: 0,
            failed: 0,
            blocked: Vec::new(),
        }
    }

    /// `true` if the run ended with threads that can never be resumed.
    pub fn is_deadlocked(&self) -> bool {
        !self.blocked.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Single-context cooperative scheduler.
///
/// The thread table keeps the [`ThreadInfo`] of finished threads so that
/// [`Scheduler::status`] can still answer for them; their bodies are freed
/// as soon as they end.  A long-lived scheduler that keeps spawning should
/// call [`Scheduler::forget_finished`] between runs to bound the table.
pub struct Scheduler {
    inner: Rc<SchedulerInner>,
}

struct SchedulerInner {
    /// Time-ordered instance id (UUID v7), used to correlate diagnostics.
    id: Uuid,

    config: KernelConfig,

    /// Runnable threads, strict FIFO.
    ready: ReadyQueue,

    /// Live threads plus finished ones not yet forgotten.
    threads: RefCell<HashMap<ThreadId, Thread>>,

    next_id: Cell<u64>,

    /// Set for the duration of `run()`.
    running: Cell<bool>,
}

/// Weak reference to a scheduler, for spawning from inside thread bodies.
///
/// A body that captured the [`Scheduler`] itself would keep it alive through
/// its own thread table; capture a `Handle` instead.
#[derive(Clone)]
pub struct Handle {
    inner: Weak<SchedulerInner>,
}

impl Scheduler {
    /// Create a scheduler with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::build(KernelConfig::default())
    }

    /// Create a scheduler with a validated configuration.
    pub fn with_config(config: KernelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: KernelConfig) -> Self {
        Self {
            inner: Rc::new(SchedulerInner {
                id: Uuid::now_v7(),
                config,
                ready: ReadyQueue::new(),
                threads: RefCell::new(HashMap::new()),
                next_id: Cell::new(1),
                running: Cell::new(false),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn config(&self) -> &KernelConfig {
        &self.inner.config
    }

    /// A weak handle suitable for capture by thread bodies.
    pub fn handle(&self) -> Handle {
        Handle {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Create a thread running `body` and append it to the ready queue.
    ///
    /// Nothing runs until [`Scheduler::run`] is called (or, when spawning
    /// from a running thread, until the new thread's turn comes).
    pub fn spawn<F>(&self, name: impl Into<String>, body: F) -> ThreadId
    where
        F: Future + 'static,
        F::Output: ThreadOutcome,
    {
        self.inner.spawn(name.into(), body)
    }

    /// Drive the ready queue until it is empty.
    ///
    /// Returns [`KernelError::ReentrantRun`] if called from inside one of this
    /// scheduler's own threads.
    pub fn run(&self) -> Result<RunSummary> {
        if self.inner.running.replace(true) {
            return Err(KernelError::ReentrantRun);
        }
        let _running = RunningGuard(&self.inner.running);

        let span = tracing::info_span!(
            "scheduler",
            kernel = %self.inner.config.name,
            kernel_id = %self.inner.id
        );
        let _enter = span.enter();

        let mut summary = RunSummary::new(self.inner.id);
        while let Some(id) = self.inner.ready.dequeue() {
            self.inner.step(id, &mut summary)?;
        }

        summary.blocked = self.inner.blocked_threads();
        if summary.is_deadlocked() {
            tracing::warn!(
                blocked = summary.blocked.len(),
                resumes = summary.resumes,
                "ready queue is empty but threads are still parked; they will never run"
            );
        } else {
            tracing::info!(
                resumes = summary.resumes,
                completed = summary.completed,
                failed = summary.failed,
                "ready queue is empty, nothing else to do"
            );
        }
        Ok(summary)
    }

    /// Query the current state of a thread.
    pub fn status(&self, thread_id: ThreadId) -> Result<ThreadInfo> {
        self.inner
            .threads
            .borrow()
            .get(&thread_id)
            .map(snapshot)
            .ok_or(KernelError::ThreadNotFound { thread_id })
    }

    /// Return a snapshot of all known threads keyed by their id.
    pub fn all_threads(&self) -> HashMap<ThreadId, ThreadInfo> {
        self.inner
            .threads
            .borrow()
            .iter()
            .map(|(id, thread)| (*id, snapshot(thread)))
            .collect()
    }

    /// Drop the metadata of every completed or failed thread.
    ///
    /// Returns how many entries were removed.  Their ids then report
    /// [`KernelError::ThreadNotFound`].
    pub fn forget_finished(&self) -> usize {
        let mut threads = self.inner.threads.borrow_mut();
        let before = threads.len();
        threads.retain(|_, thread| !thread.info.status.is_finished());
        let forgotten = before - threads.len();
        if forgotten > 0 {
            tracing::debug!(forgotten, remaining = threads.len(), "forgot finished threads");
        }
        forgotten
    }

    /// Number of threads currently waiting for a turn.
    pub fn ready_len(&self) -> usize {
        self.inner.ready.len()
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("id", &self.inner.id)
            .field("name", &self.inner.config.name)
            .field("ready", &self.inner.ready.len())
            .field("threads", &self.inner.threads.borrow().len())
            .finish()
    }
}

impl Handle {
    /// Spawn a thread on the scheduler this handle points to.
    pub fn spawn<F>(&self, name: impl Into<String>, body: F) -> Result<ThreadId>
    where
        F: Future + 'static,
        F::Output: ThreadOutcome,
    {
        let inner = self.inner.upgrade().ok_or(KernelError::SchedulerGone)?;
        Ok(inner.spawn(name.into(), body))
    }
}

// -- Private helpers --------------------------------------------------------

impl SchedulerInner {
    fn spawn<F>(&self, name: String, body: F) -> ThreadId
    where
        F: Future + 'static,
        F::Output: ThreadOutcome,
    {
        let id = ThreadId::from_raw(self.next_id.get());
        self.next_id.set(self.next_id.get() + 1);

        let continuation = Continuation::new(id, self.ready.clone());
        tracing::debug!(thread_id = %id, thread_name = %name, "thread spawned");

        let thread = Thread::new(id, name, thread::wrap_body(body), Arc::clone(&continuation));
        self.threads.borrow_mut().insert(id, thread);
        continuation.schedule();
        id
    }

    /// Resume one thread and account for how it stopped.
    fn step(&self, id: ThreadId, summary: &mut RunSummary) -> Result<()> {
        // The body leaves the table while it runs so that it can spawn.
        let taken = {
            let mut threads = self.threads.borrow_mut();
            threads.get_mut(&id).and_then(|thread| {
                let body = thread.body.take()?;
                thread.info.status = ThreadStatus::Running;
                thread.info.resumes += 1;
                Some((body, Arc::clone(&thread.continuation)))
            })
        };
        let Some((mut body, continuation)) = taken else {
            tracing::trace!(thread_id = %id, "skipping ready entry with no suspended body");
            return Ok(());
        };

        continuation.consume();
        summary.resumes += 1;
        tracing::trace!(thread_id = %id, "resuming thread");

        let outcome = match thread::resume(&mut body, &continuation) {
            Poll::Pending => {
                let mut threads = self.threads.borrow_mut();
                if let Some(thread) = threads.get_mut(&id) {
                    thread.body = Some(body);
                    thread.info.status = if continuation.is_queued() {
                        ThreadStatus::Ready
                    } else {
                        ThreadStatus::Blocked
                    };
                }
                return Ok(());
            }
            Poll::Ready(outcome) => outcome,
        };
        drop(body);

        let name = {
            let mut threads = self.threads.borrow_mut();
            match threads.get_mut(&id) {
                Some(thread) => {
                    thread.finish(&outcome);
                    thread.info.name.clone()
                }
                None => String::new(),
            }
        };

        match outcome {
            Ok(()) => {
                summary.completed += 1;
                tracing::info!(thread_id = %id, thread_name = %name, "cooperative thread ending");
                Ok(())
            }
            Err(reason) => {
                tracing::error!(
                    thread_id = %id,
                    thread_name = %name,
                    error = %reason,
                    "cooperative thread failed"
                );
                match self.config.failure_policy {
                    FailurePolicy::Propagate => Err(KernelError::ThreadFailed {
                        thread_id: id,
                        name,
                        reason,
                    }),
                    FailurePolicy::LogAndContinue => {
                        summary.failed += 1;
                        Ok(())
                    }
                }
            }
        }
    }

    fn blocked_threads(&self) -> Vec<ThreadId> {
        let mut blocked: Vec<ThreadId> = self
            .threads
            .borrow()
            .values()
            .filter(|thread| snapshot(thread).status == ThreadStatus::Blocked)
            .map(|thread| thread.info.id)
            .collect();
        blocked.sort_unstable();
        blocked
    }
}

/// Metadata as callers should see it.  A parked thread that has been handed
/// off but not resumed yet is reported as `Ready`.
fn snapshot(thread: &Thread) -> ThreadInfo {
    let mut info = thread.info.clone();
    if info.status == ThreadStatus::Blocked && thread.continuation.is_queued() {
        info.status = ThreadStatus::Ready;
    }
    info
}

/// Clears the `running` flag however `run()` exits.
struct RunningGuard<'a>(&'a Cell<bool>);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
