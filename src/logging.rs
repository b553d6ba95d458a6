//! Logging
//!
//! tracing + tracing-subscriber, level from `RUST_LOG` (default `info`).
//! Output goes to stderr: the CLI reserves stdout for JSON.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize the global subscriber.
///
/// # Environment
/// - `RUST_LOG`: filter directive, e.g. `debug` or `garmentbom_core=trace`
pub fn init() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .init();
}

/// Subscriber for tests: debug level, captured by the test harness.
/// Safe to call more than once.
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
