// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod model;
pub mod solver;
pub mod trace;
pub mod types;

use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::{InstanceFile, builtin_instance, builtin_names, load_and_validate};
use crate::engine::{SolveReport, SolveRequest, run_traced_solve};
use crate::fs::RealFileSystem;
use crate::model::Problem;
use crate::solver::SearchLimits;
use crate::trace::MonotonicClock;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - instance selection (built-in or TOML file)
/// - the traced solve on a blocking worker
/// - Ctrl-C handling (stops the search; the trace is still closed)
/// - the console summary
pub async fn run(args: CliArgs) -> Result<()> {
    if args.list_instances {
        for name in builtin_names() {
            println!("{name}");
        }
        return Ok(());
    }

    let instance = resolve_instance(&args)?;
    let problem = Arc::new(Problem::from_instance(&instance));

    if args.dry_run {
        print!("{}", render_dry_run(&problem));
        debug!("dry-run complete (no solve)");
        return Ok(());
    }

    let request = SolveRequest {
        problem,
        output: args.output.clone(),
        limits: search_limits(&args)?,
    };

    // Ctrl-C → stop the search gracefully.
    let cancel = Arc::new(AtomicBool::new(false));
    {
        let flag = Arc::clone(&cancel);
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            info!("Ctrl+C received; stopping search");
            flag.store(true, Ordering::Relaxed);
        });
    }

    // The tracing core is single-threaded and synchronous; keep it off the
    // async workers.
    let report = tokio::task::spawn_blocking(move || {
        run_traced_solve(
            &request,
            &RealFileSystem,
            Box::new(MonotonicClock::new()),
            Some(cancel),
        )
    })
    .await
    .context("solver task panicked")??;

    print!("{}", render_summary(&report));
    Ok(())
}

fn resolve_instance(args: &CliArgs) -> Result<InstanceFile> {
    let instance = match &args.config {
        Some(path) => {
            debug!(?path, "loading instance file");
            load_and_validate(&RealFileSystem, path)
                .with_context(|| format!("loading instance {:?}", path))?
        }
        None => builtin_instance(&args.instance)?,
    };
    info!(
        instance = instance.name(),
        tasks = instance.tasks().len(),
        resources = instance.resources().len(),
        "instance loaded"
    );
    Ok(instance)
}

fn search_limits(args: &CliArgs) -> Result<SearchLimits> {
    let time_limit = if args.time_limit > 0.0 {
        Some(
            Duration::try_from_secs_f64(args.time_limit)
                .map_err(|e| anyhow!("invalid --time-limit {}: {e}", args.time_limit))?,
        )
    } else {
        None
    };

    Ok(SearchLimits {
        time_limit,
        node_limit: args.node_limit,
        optimize: !args.first_solution,
    })
}

/// Console summary of a finished solve.
pub fn render_summary(report: &SolveReport) -> String {
    let mut out = String::new();
    let outcome = &report.outcome;
    let _ = writeln!(out, "status: {}", outcome.status);
    match &outcome.best {
        Some(schedule) => {
            let _ = writeln!(out, "makespan: {}", schedule.makespan);
            let _ = writeln!(out, "starts: {:?}", schedule.starts);
        }
        None => {
            let _ = writeln!(out, "no schedule found");
        }
    }
    let _ = writeln!(
        out,
        "search: {} nodes, {} conflicts, {} solutions in {} ms",
        outcome.stats.nodes,
        outcome.stats.conflicts,
        outcome.stats.solutions,
        outcome.elapsed.as_millis()
    );

    let trace = &report.trace;
    let path = trace.path.display();
    let _ = if trace.complete {
        writeln!(out, "trace: {} events written to {path}", trace.events_written)
    } else if trace.events_written > 0 {
        writeln!(
            out,
            "trace: incomplete, {} events written and {} dropped in {path} (recoverable prefix)",
            trace.events_written, trace.events_dropped
        )
    } else {
        writeln!(out, "trace: not written ({path})")
    };
    out
}

/// Description of the problem printed by `--dry-run`.
pub fn render_dry_run(problem: &Problem) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "searchtrace dry-run");
    let _ = writeln!(out, "  instance = {}", problem.name());
    let _ = writeln!(out, "  horizon = {}", problem.horizon());
    let _ = writeln!(out);

    let _ = writeln!(out, "resources ({}):", problem.resources().len());
    for resource in problem.resources() {
        let _ = writeln!(out, "  - {} (capacity {})", resource.name, resource.capacity);
    }
    let _ = writeln!(out);

    let entry: Vec<&str> = problem
        .graph()
        .roots()
        .map(|i| problem.tasks()[i].name.as_str())
        .collect();
    let _ = writeln!(out, "tasks ({}), entry: {}:", problem.n_tasks(), entry.join(", "));
    for task in problem.tasks() {
        let _ = writeln!(out, "  - [{}] {}", task.id, task.name);
        let _ = writeln!(out, "      duration: {}", task.duration);
        if !task.successors.is_empty() {
            let names: Vec<&str> = task
                .successors
                .iter()
                .filter_map(|&id| problem.index_of(id))
                .map(|i| problem.tasks()[i].name.as_str())
                .collect();
            let _ = writeln!(out, "      successors: {}", names.join(", "));
        }
        if task.demands.iter().any(|&d| d > 0) {
            let _ = writeln!(out, "      demands: {:?}", task.demands);
        }
    }
    out
}
