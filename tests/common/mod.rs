#![allow(dead_code)]

use std::sync::Arc;

use taskline::sink::MemorySink;

pub use taskline_test_utils::ops;
pub use taskline_test_utils::{init_tracing, with_timeout};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// A fresh recording sink, shared between the runner and the test.
pub fn memory_sink() -> Arc<MemorySink> {
    Arc::new(MemorySink::new())
}
