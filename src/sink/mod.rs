// src/sink/mod.rs

//! Append-only progress log consumed by the presentation layer.
//!
//! The runner writes one line per status transition; operations write their
//! own output through [`TaskContext::log`](crate::task::TaskContext::log).
//! Writers may run concurrently (background units, the foreground loop), so
//! every sink must accept interleaved calls and keep each writer's lines in
//! the order that writer produced them.
//!
//! - [`memory`] holds [`NullSink`] and the recording [`MemorySink`].
//! - [`console`] holds the stdout [`ConsoleSink`], the channel-backed
//!   [`ChannelSink`] and [`FanoutSink`].

use std::fmt;

pub mod console;
pub mod memory;

pub use console::{ChannelSink, ConsoleSink, FanoutSink};
pub use memory::{MemorySink, NullSink};

/// Observer of human-readable progress lines. Never fails.
pub trait LogSink: Send + Sync {
    /// `tag` is the task description, or `None` for run-level lines.
    fn write(&self, tag: Option<&str>, message: &str);
}

/// One owned log line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub tag: Option<String>,
    pub message: String,
}

impl LogLine {
    pub fn new(tag: Option<&str>, message: &str) -> Self {
        Self {
            tag: tag.map(str::to_string),
            message: message.to_string(),
        }
    }
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(f, "{tag}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}
