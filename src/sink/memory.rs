// src/sink/memory.rs

use std::sync::{Mutex, PoisonError};

use super::{LogLine, LogSink};

/// Discards every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl LogSink for NullSink {
    fn write(&self, _tag: Option<&str>, _message: &str) {}
}

/// Records every line in arrival order.
#[derive(Debug, Default)]
pub struct MemorySink {
    lines: Mutex<Vec<LogLine>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all lines written so far.
    pub fn lines(&self) -> Vec<LogLine> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Messages written with the given tag, in order.
    pub fn messages_for(&self, tag: &str) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.tag.as_deref() == Some(tag))
            .map(|line| line.message)
            .collect()
    }

    /// Untagged (run-level) messages, in order.
    pub fn run_messages(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter(|line| line.tag.is_none())
            .map(|line| line.message)
            .collect()
    }

    /// Number of lines whose message contains `needle`, regardless of tag.
    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines()
            .iter()
            .filter(|line| line.message.contains(needle))
            .count()
    }
}

impl LogSink for MemorySink {
    fn write(&self, tag: Option<&str>, message: &str) {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(LogLine::new(tag, message));
    }
}
