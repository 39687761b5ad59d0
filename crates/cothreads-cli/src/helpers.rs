//! Shared helper functions used across CLI subcommands.

use cothreads_kernel::RunSummary;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialize the tracing subscriber with the given default log level.
///
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

/// Render a run summary for humans.
pub fn format_summary(summary: &RunSummary) -> String {
    let mut out = format!(
        "  kernel:    {}\n  resumes:   {}\n  completed: {}\n  failed:    {}\n",
        summary.kernel_id, summary.resumes, summary.completed, summary.failed
    );
    if summary.is_deadlocked() {
        let blocked: Vec<String> = summary.blocked.iter().map(ToString::to_string).collect();
        out.push_str(&format!(
            "  blocked:   {} (never resumed: {})\n",
            blocked.len(),
            blocked.join(", ")
        ));
    } else {
        out.push_str("  blocked:   0\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use cothreads_kernel::{Scheduler, ThreadId};

    fn summary(blocked: Vec<ThreadId>) -> RunSummary {
        let mut summary = Scheduler::new().run().unwrap();
        summary.completed = 2;
        summary.blocked = blocked;
        summary
    }

    #[test]
    fn clean_summary_has_no_blocked_list() {
        let text = format_summary(&summary(Vec::new()));
        assert!(text.contains("completed: 2"));
        assert!(text.contains("blocked:   0"));
    }

    #[test]
    fn deadlocked_summary_lists_threads() {
        let text = format_summary(&summary(vec![ThreadId::from_raw(3), ThreadId::from_raw(5)]));
        assert!(text.contains("never resumed: thread-3, thread-5"));
    }
}
