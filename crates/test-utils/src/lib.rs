//! Shared helpers for taskline's integration tests.

pub mod builders;
pub mod ops;

use std::future::Future;
use std::sync::Once;
use std::time::Duration;

use tracing_subscriber::EnvFilter;

/// Upper bound for a single test run; every scenario finishes well inside it.
pub const TEST_TIMEOUT: Duration = Duration::from_secs(5);

static TRACING: Once = Once::new();

/// Route engine diagnostics to the test harness.
///
/// Output is captured per test and only shown for failures (or with
/// `--nocapture`). `TASKLINE_LOG=debug cargo test` raises the level.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let filter = std::env::var(taskline::logging::LOG_ENV_VAR)
            .ok()
            .and_then(|value| EnvFilter::try_new(value).ok())
            .unwrap_or_else(|| EnvFilter::new("taskline=info"));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Await `fut`, panicking if it takes longer than [`TEST_TIMEOUT`].
pub async fn with_timeout<F: Future>(fut: F) -> F::Output {
    match tokio::time::timeout(TEST_TIMEOUT, fut).await {
        Ok(output) => output,
        Err(_) => panic!("run did not finish within {TEST_TIMEOUT:?}"),
    }
}
