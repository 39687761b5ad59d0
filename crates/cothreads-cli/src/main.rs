//! CLI entry point for cothreads.
//!
//! This binary provides the `cothreads` command, whose subcommands run
//! demonstration workloads on a cooperative scheduler and report the outcome.

mod cli;
mod helpers;
mod scenarios;
mod settings;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cothreads_kernel::Scheduler;
use serde::Serialize;
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::helpers::{format_summary, init_tracing};

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = settings::load_settings(cli.config.as_deref())?;
    init_tracing(&settings.log.level);

    let scheduler =
        Scheduler::with_config(settings.kernel).context("failed to create scheduler")?;
    info!(kernel_id = %scheduler.id(), kernel = %scheduler.config().name, "scheduler ready");

    match cli.command {
        Commands::Contention {
            threads,
            reps,
            units,
        } => cmd_contention(&scheduler, cli.json, threads, reps, units),
        Commands::RoundRobin { threads, rounds } => {
            cmd_round_robin(&scheduler, cli.json, threads, rounds)
        }
        Commands::Deadlock => cmd_deadlock(&scheduler, cli.json),
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

fn cmd_contention(
    scheduler: &Scheduler,
    json: bool,
    threads: u64,
    reps: u64,
    units: usize,
) -> Result<()> {
    info!(threads, reps, units, "starting contention workload");
    let report = scenarios::contention(scheduler, threads, reps, units)?;

    if json {
        print_json(&report)?;
    } else {
        println!();
        println!("  Contention: {threads} threads x {reps} reps, {units} unit(s)");
        println!("  counter:   {} (expected {})", report.counter, report.expected);
        print!("{}", format_summary(&report.summary));
        println!();
    }

    if !report.is_consistent() && !report.summary.is_deadlocked() {
        bail!(
            "lost updates: counter is {} but expected {}",
            report.counter,
            report.expected
        );
    }
    Ok(())
}

fn cmd_round_robin(scheduler: &Scheduler, json: bool, threads: usize, rounds: usize) -> Result<()> {
    info!(threads, rounds, "starting round-robin workload");
    let report = scenarios::round_robin(scheduler, threads, rounds)?;

    if json {
        print_json(&report)?;
    } else {
        println!();
        println!("  Round robin: {}", report.trace.join(","));
        print!("{}", format_summary(&report.summary));
        println!();
    }
    Ok(())
}

fn cmd_deadlock(scheduler: &Scheduler, json: bool) -> Result<()> {
    info!("starting deadlock workload");
    let summary = scenarios::deadlock(scheduler)?;

    if json {
        print_json(&summary)?;
    } else {
        println!();
        println!("  Deadlock: the ready queue emptied with a thread still parked.");
        print!("{}", format_summary(&summary));
        println!();
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let formatted = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    println!("{formatted}");
    Ok(())
}
