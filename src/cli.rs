// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Default trace path when no output argument is given.
pub const DEFAULT_OUTPUT: &str = "events.json";

/// Command-line arguments for `searchtrace`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "searchtrace",
    version,
    about = "Solve a scheduling instance and record a replayable trace of the search.",
    long_about = None
)]
pub struct CliArgs {
    /// Where to write the trace document.
    #[arg(value_name = "OUTPUT", default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Built-in instance to solve (see `--list-instances`).
    #[arg(long, value_name = "NAME", default_value = "simple")]
    pub instance: String,

    /// Instance file (TOML) to solve instead of a built-in instance.
    #[arg(long, value_name = "PATH", conflicts_with = "instance")]
    pub config: Option<PathBuf>,

    /// Wall-clock limit for the search, in seconds.
    #[arg(long, value_name = "SECS", default_value_t = 30.0)]
    pub time_limit: f64,

    /// Maximum number of search nodes to explore.
    #[arg(long, value_name = "N")]
    pub node_limit: Option<u64>,

    /// Stop at the first feasible schedule instead of minimising makespan.
    #[arg(long)]
    pub first_solution: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SEARCHTRACE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load and validate the instance, print it, but don't solve.
    #[arg(long)]
    pub dry_run: bool,

    /// Print the names of the built-in instances and exit.
    #[arg(long)]
    pub list_instances: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
