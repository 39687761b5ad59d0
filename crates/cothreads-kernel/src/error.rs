//! Kernel error types.
//!
//! All kernel subsystems surface errors through [`KernelError`], which is the
//! single error type returned by every public API in this crate.  Misuse that
//! the kernel cannot observe (polling a suspension future outside a kernel
//! thread) is not represented here; see the crate documentation.

use crate::thread::ThreadId;

/// Unified error type for the cooperative threading kernel.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    // -- Thread errors ------------------------------------------------------
    /// The referenced thread was never spawned on this scheduler.
    #[error("thread not found: {thread_id}")]
    ThreadNotFound {
        /// The id that was looked up.
        thread_id: ThreadId,
    },

    /// A thread body returned an error or panicked while the scheduler was
    /// configured with [`FailurePolicy::Propagate`](crate::FailurePolicy).
    #[error("thread {thread_id} ({name}) failed: {reason}")]
    ThreadFailed {
        thread_id: ThreadId,
        name: String,
        reason: String,
    },

    // -- Scheduler errors ---------------------------------------------------
    /// `run()` was invoked while the same scheduler was already running.
    #[error("scheduler is already running; run() is not reentrant")]
    ReentrantRun,

    /// A [`Handle`](crate::Handle) outlived the scheduler it points to.
    #[error("scheduler has been dropped")]
    SchedulerGone,

    // -- Configuration ------------------------------------------------------
    /// A configuration value was rejected.
    #[error("invalid kernel configuration: {reason}")]
    InvalidConfig { reason: String },
}

/// Convenience alias used throughout the kernel crate.
pub type Result<T> = std::result::Result<T, KernelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_failed_display() {
        let err = KernelError::ThreadFailed {
            thread_id: ThreadId::from_raw(7),
            name: "worker".into(),
            reason: "boom".into(),
        };
        assert_eq!(err.to_string(), "thread thread-7 (worker) failed: boom");
    }

    #[test]
    fn thread_not_found_display() {
        let err = KernelError::ThreadNotFound {
            thread_id: ThreadId::from_raw(3),
        };
        assert_eq!(err.to_string(), "thread not found: thread-3");
    }

    #[test]
    fn reentrant_run_display() {
        assert_eq!(
            KernelError::ReentrantRun.to_string(),
            "scheduler is already running; run() is not reentrant"
        );
    }
}
