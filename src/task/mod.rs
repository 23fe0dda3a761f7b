// src/task/mod.rs

//! Task representation.
//!
//! - [`spec`] holds the immutable [`TaskSpec`] a caller builds before a run,
//!   plus the [`TaskContext`] every operation receives.
//! - [`status`] is the per-task lifecycle state machine.
//! - [`row`] is the per-task bookkeeping row the runner mutates and the
//!   presentation layer reads.

pub mod row;
pub mod spec;
pub mod status;

pub use row::{TaskHandle, TaskRow};
pub use spec::{Operation, OperationFuture, OperationResult, TaskContext, TaskSpec};
pub use status::{InvalidTransition, TaskStatus};
