// src/exec/mod.rs

//! Process execution layer.
//!
//! Operations that run shell commands with `tokio::process::Command`,
//! streaming their output into the run's [`LogSink`](crate::sink::LogSink).
//! The orchestrator itself never spawns processes; these are ordinary task
//! operations built for plan files and callers that want them.

pub mod command;

pub use command::{command_operation, run_command, CommandSpec};
