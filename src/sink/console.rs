// src/sink/console.rs

use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tracing::trace;

use super::{LogLine, LogSink};

/// Prints each line to a writer (stdout by default).
///
/// Write errors are swallowed: a closed terminal must not fail the run.
pub struct ConsoleSink {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    pub fn stdout() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: Mutex::new(Box::new(writer)),
        }
    }
}

impl LogSink for ConsoleSink {
    fn write(&self, tag: Option<&str>, message: &str) {
        let line = LogLine::new(tag, message);
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if writeln!(out, "{line}").and_then(|_| out.flush()).is_err() {
            trace!(%line, "console sink write failed; dropping line");
        }
    }
}

/// Forwards lines to a receiver, e.g. a UI task that renders them.
///
/// Lines written after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<LogLine>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<LogLine>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl LogSink for ChannelSink {
    fn write(&self, tag: Option<&str>, message: &str) {
        let _ = self.tx.send(LogLine::new(tag, message));
    }
}

/// Duplicates every line to several sinks, in the order they were added.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn LogSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl LogSink for FanoutSink {
    fn write(&self, tag: Option<&str>, message: &str) {
        for sink in &self.sinks {
            sink.write(tag, message);
        }
    }
}
