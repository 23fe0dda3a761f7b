// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_plan_path;

/// Command-line arguments for `taskline`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskline",
    version,
    about = "Run an ordered list of setup steps with background helpers, aborting cleanly on failure.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the task plan (TOML).
    #[arg(long, short = 'p', value_name = "PATH", default_value_os_t = default_plan_path())]
    pub plan: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKLINE_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the plan, but don't execute any commands.
    #[arg(long)]
    pub dry_run: bool,
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
