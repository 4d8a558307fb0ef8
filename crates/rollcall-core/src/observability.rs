//! Logging setup.
//!
//! The engine only emits `tracing` events; binaries pick the subscriber.
//!
//! ```no_run
//! rollcall_core::observability::init_logging(false, false);
//! tracing::info!("rollcall started");
//! ```

use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins over `verbose`. With `json` every event is one JSON line.
pub fn init_logging(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rollcall={default_level},rollcall_core={default_level}")));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    // try_init: a second call (tests, embedding) keeps the first subscriber
    let _ = if json {
        builder.json().with_current_span(true).try_init()
    } else {
        builder.compact().try_init()
    };

    tracing::debug!(verbose, json, "logging initialized");
}

/// Console-only debug logging captured by the test harness.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
