//! Test logging initialization for integration test binaries.
//!
//! Respects, in order of precedence: `TEST_LOG`, `RUST_LOG`, `"warn"`.

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = std::env::var("TEST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_string());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_test_writer()
        .try_init();
}

/// Runs once per integration test binary, before any test.
#[ctor::ctor]
fn _auto_init_for_integration_tests() {
    init();
}
