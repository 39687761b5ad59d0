//! Cooperative threads and their lifecycle.
//!
//! A thread is a future.  Spawning boxes the body into a local future whose
//! first poll is the thread's start; every `Pending` is a suspension; `Ready`
//! is the end of the thread.  The wrapper also normalises the body's output
//! through [`ThreadOutcome`] and turns panics into ordinary failures so the
//! scheduler sees a single `Result<(), String>` per thread.
//!
//! # Thread lifecycle
//!
//! ```text
//! Ready  -->  Running  -->  Completed
//!   ^            |     \->  Failed
//!   |            v
//!   +------  Blocked   (parked on a wait queue)
//!   +-------- Ready    (yielded)
//! ```

use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use futures::task::waker_ref;
use serde::{Deserialize, Serialize};

use crate::continuation::Continuation;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Sequential thread identifier, unique within one scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(u64);

impl ThreadId {
    /// Build an id from its raw number.
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread-{}", self.0)
    }
}

/// Lifecycle state of a cooperative thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreadStatus {
    /// Waiting in the ready queue (newly spawned, yielded, or handed off).
    Ready,
    /// Being resumed right now.
    Running,
    /// Parked on a wait queue; only an explicit hand-off makes it ready.
    Blocked,
    /// The body returned successfully.
    Completed,
    /// The body returned an error or panicked.
    Failed,
}

impl ThreadStatus {
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Metadata snapshot of a thread visible to external callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadInfo {
    pub id: ThreadId,
    pub name: String,
    pub status: ThreadStatus,
    /// How many times the scheduler has resumed this thread.
    pub resumes: u64,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub error: Option<String>,
}

/// Values a thread body may finish with.
///
/// Bodies that cannot fail return `()`; fallible bodies return
/// `Result<(), E>` for any displayable `E`.  A block whose last statement
/// always diverges (`panic!`, `loop {}`) has output `!`, which is not a
/// `ThreadOutcome`; such a body must still end in `()`.
pub trait ThreadOutcome {
    fn into_outcome(self) -> Result<(), String>;
}

impl ThreadOutcome for () {
    fn into_outcome(self) -> Result<(), String> {
        Ok(())
    }
}

impl<E: fmt::Display> ThreadOutcome for Result<(), E> {
    fn into_outcome(self) -> Result<(), String> {
        self.map_err(|e| e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Internal representation
// ---------------------------------------------------------------------------

/// The suspended remainder of a thread.
pub(crate) type ThreadBody = LocalBoxFuture<'static, Result<(), String>>;

/// Scheduler-side record of one thread.
pub(crate) struct Thread {
    pub(crate) info: ThreadInfo,
    /// `None` while the thread is being resumed and after it finished.
    pub(crate) body: Option<ThreadBody>,
    pub(crate) continuation: Arc<Continuation>,
}

impl Thread {
    pub(crate) fn new(
        id: ThreadId,
        name: String,
        body: ThreadBody,
        continuation: Arc<Continuation>,
    ) -> Self {
        Self {
            info: ThreadInfo {
                id,
                name,
                status: ThreadStatus::Ready,
                resumes: 0,
                created_at: Utc::now(),
                finished_at: None,
                error: None,
            },
            body: Some(body),
            continuation,
        }
    }

    /// Record the end of the thread and release its body.
    pub(crate) fn finish(&mut self, outcome: &Result<(), String>) {
        self.body = None;
        self.continuation.retire();
        self.info.finished_at = Some(Utc::now());
        match outcome {
            Ok(()) => self.info.status = ThreadStatus::Completed,
            Err(reason) => {
                self.info.status = ThreadStatus::Failed;
                self.info.error = Some(reason.clone());
            }
        }
    }
}

/// Wrap a user body into the uniform shape the scheduler drives.
pub(crate) fn wrap_body<F>(body: F) -> ThreadBody
where
    F: Future + 'static,
    F::Output: ThreadOutcome,
{
    body.map(ThreadOutcome::into_outcome).boxed_local()
}

/// Resume `body` until it suspends or ends.
///
/// The continuation is installed as the waker, so `yield_now` and `park`
/// capture exactly this thread.  A panic unwinding out of the body ends the
/// thread with a failure.
pub(crate) fn resume(
    body: &mut ThreadBody,
    continuation: &Arc<Continuation>,
) -> Poll<Result<(), String>> {
    let waker = waker_ref(continuation);
    let mut cx = Context::from_waker(&waker);
    match catch_unwind(AssertUnwindSafe(|| body.as_mut().poll(&mut cx))) {
        Ok(poll) => poll,
        Err(payload) => Poll::Ready(Err(format!(
            "thread panicked: {}",
            panic_message(&*payload)
        ))),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ready_queue::ReadyQueue;

    fn continuation() -> Arc<Continuation> {
        Continuation::new(ThreadId::from_raw(1), ReadyQueue::new())
    }

    #[test]
    fn thread_id_display() {
        assert_eq!(ThreadId::from_raw(42).to_string(), "thread-42");
        assert_eq!(ThreadId::from_raw(42).as_u64(), 42);
    }

    #[test]
    fn unit_body_completes() {
        let mut body = wrap_body(async {});
        assert_eq!(resume(&mut body, &continuation()), Poll::Ready(Ok(())));
    }

    #[test]
    fn error_body_reports_reason() {
        let mut body = wrap_body(async { Err::<(), _>("bad input") });
        assert_eq!(
            resume(&mut body, &continuation()),
            Poll::Ready(Err("bad input".to_string()))
        );
    }

    #[test]
    fn panicking_body_becomes_failure() {
        let explode = true;
        let mut body = wrap_body(async move {
            if explode {
                panic!("kaboom");
            }
        });
        match resume(&mut body, &continuation()) {
            Poll::Ready(Err(reason)) => assert_eq!(reason, "thread panicked: kaboom"),
            other => panic!("unexpected poll result: {other:?}"),
        }
    }

    #[test]
    fn finish_records_failure() {
        let cont = continuation();
        let mut thread = Thread::new(
            ThreadId::from_raw(1),
            "t".into(),
            wrap_body(async {}),
            Arc::clone(&cont),
        );
        thread.finish(&Err("nope".into()));
        assert_eq!(thread.info.status, ThreadStatus::Failed);
        assert_eq!(thread.info.error.as_deref(), Some("nope"));
        assert!(thread.info.finished_at.is_some());
        assert!(thread.body.is_none());
        assert!(cont.is_queued(), "retired continuation stays marked");
    }

    #[test]
    fn finished_statuses() {
        assert!(ThreadStatus::Completed.is_finished());
        assert!(ThreadStatus::Failed.is_finished());
        assert!(!ThreadStatus::Blocked.is_finished());
        assert!(!ThreadStatus::Ready.is_finished());
    }
}
