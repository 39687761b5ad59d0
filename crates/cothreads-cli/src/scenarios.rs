//! Demonstration workloads driven by the CLI subcommands.
//!
//! Each workload spawns its threads on the given scheduler, runs it to
//! completion and returns what it observed alongside the [`RunSummary`].

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use anyhow::{Context, Result};
use cothreads_kernel::{RunSummary, Scheduler, Semaphore, yield_now};
use serde::Serialize;

/// Result of [`contention`].
#[derive(Debug, Serialize)]
pub struct ContentionReport {
    pub counter: u64,
    pub expected: u64,
    pub summary: RunSummary,
}

impl ContentionReport {
    pub fn is_consistent(&self) -> bool {
        self.counter == self.expected
    }
}

/// A root thread spawns `threads` workers; each worker does `reps` rounds of
/// acquire, increment, yield, release, yield.
pub fn contention(
    scheduler: &Scheduler,
    threads: u64,
    reps: u64,
    units: usize,
) -> Result<ContentionReport> {
    let handle = scheduler.handle();
    let sem = Rc::new(Semaphore::new(units));
    let counter = Rc::new(Cell::new(0u64));

    let (root_sem, root_counter) = (Rc::clone(&sem), Rc::clone(&counter));
    scheduler.spawn("root", async move {
        for i in 0..threads {
            let (sem, counter) = (Rc::clone(&root_sem), Rc::clone(&root_counter));
            handle.spawn(format!("worker-{i}"), async move {
                for _ in 0..reps {
                    sem.acquire().await;
                    counter.set(counter.get() + 1);
                    yield_now().await;
                    sem.release();
                    yield_now().await;
                }
            })?;
        }
        Ok::<(), cothreads_kernel::KernelError>(())
    });

    let summary = scheduler.run().context("contention run failed")?;
    tracing::debug!(
        units_left = sem.available_units(),
        waiting = sem.waiting(),
        "contention finished"
    );
    Ok(ContentionReport {
        counter: counter.get(),
        expected: threads * reps,
        summary,
    })
}

/// Result of [`round_robin`].
#[derive(Debug, Serialize)]
pub struct RoundRobinReport {
    /// Labels in the order they were printed.
    pub trace: Vec<String>,
    pub summary: RunSummary,
}

/// `threads` labelled threads each record their label and yield, `rounds`
/// times.
pub fn round_robin(scheduler: &Scheduler, threads: usize, rounds: usize) -> Result<RoundRobinReport> {
    let trace = Rc::new(RefCell::new(Vec::new()));

    for index in 0..threads {
        let label = thread_label(index);
        let trace = Rc::clone(&trace);
        scheduler.spawn(label.clone(), async move {
            for _ in 0..rounds {
                trace.borrow_mut().push(label.clone());
                yield_now().await;
            }
        });
    }

    let summary = scheduler.run().context("round-robin run failed")?;
    let trace = trace.take();
    Ok(RoundRobinReport { trace, summary })
}

/// One thread waits on a semaphore with no units and no releaser.
pub fn deadlock(scheduler: &Scheduler) -> Result<RunSummary> {
    let sem = Rc::new(Semaphore::new(0));
    scheduler.spawn("waiter", async move {
        sem.acquire().await;
        tracing::error!("unreachable: semaphore was never released");
    });
    scheduler.run().context("deadlock run failed")
}

/// `A`..`Z`, then `A1`..`Z1`, and so on.
fn thread_label(index: usize) -> String {
    let letter = char::from(b'A' + (index % 26) as u8);
    match index / 26 {
        0 => letter.to_string(),
        cycle => format!("{letter}{cycle}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contention_counts_every_round() {
        let scheduler = Scheduler::new();
        let report = contention(&scheduler, 20, 10, 1).unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.counter, 200);
        assert_eq!(report.summary.completed, 21);
    }

    #[test]
    fn contention_with_several_units() {
        let scheduler = Scheduler::new();
        let report = contention(&scheduler, 8, 5, 3).unwrap();
        assert_eq!(report.counter, report.expected);
        assert!(!report.summary.is_deadlocked());
    }

    #[test]
    fn contention_with_zero_units_deadlocks() {
        let scheduler = Scheduler::new();
        let report = contention(&scheduler, 3, 1, 0).unwrap();
        assert_eq!(report.counter, 0);
        assert_eq!(report.summary.blocked.len(), 3);
    }

    #[test]
    fn round_robin_two_threads() {
        let scheduler = Scheduler::new();
        let report = round_robin(&scheduler, 2, 3).unwrap();
        assert_eq!(report.trace, vec!["A", "B", "A", "B", "A", "B"]);
    }

    #[test]
    fn deadlock_reports_blocked_thread() {
        let scheduler = Scheduler::new();
        let summary = deadlock(&scheduler).unwrap();
        assert!(summary.is_deadlocked());
        assert_eq!(summary.blocked.len(), 1);
    }

    #[test]
    fn labels_wrap_after_z() {
        assert_eq!(thread_label(0), "A");
        assert_eq!(thread_label(25), "Z");
        assert_eq!(thread_label(26), "A1");
        assert_eq!(thread_label(53), "B2");
    }
}
