//! CLI argument definitions for cothreads.
//!
//! All `clap` structures live here so that `main.rs` stays focused on
//! dispatching subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// cothreads -- a single-context cooperative threading kernel.
#[derive(Parser)]
#[command(
    name = "cothreads",
    version,
    about = "cothreads -- cooperative threading kernel workloads",
    long_about = "Runs demonstration workloads on a single-context cooperative scheduler \
                  and reports how the run ended."
)]
pub struct Cli {
    /// Path to a TOML configuration file.  Defaults to `config/default.toml`
    /// when present.
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,

    /// Print the run summary as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Many threads increment a shared counter under a semaphore.
    Contention {
        /// Number of worker threads.
        #[arg(long, short, default_value_t = 1000)]
        threads: u64,

        /// Acquire/release rounds per worker.
        #[arg(long, short, default_value_t = 1000)]
        reps: u64,

        /// Initial semaphore units.
        #[arg(long, short, default_value_t = 1)]
        units: usize,
    },

    /// Labelled threads print their label and yield, in turn.
    RoundRobin {
        /// Number of threads (labelled A, B, C, ...).
        #[arg(long, short, default_value_t = 2)]
        threads: usize,

        /// Print/yield rounds per thread.
        #[arg(long, short, default_value_t = 3)]
        rounds: usize,
    },

    /// A thread acquires a semaphore nobody will ever release.
    Deadlock,
}
