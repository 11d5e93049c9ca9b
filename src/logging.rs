//! Tracing subscriber setup for the binary.

use std::env;

use tracing::warn;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when no directive is given, or the given one does not parse.
pub const DEFAULT_LEVEL: &str = "info";

/// Install a stderr subscriber. `level` accepts anything `EnvFilter` does,
/// e.g. `debug` or `drive_keeper=trace,reqwest=warn`. Without it, `RUST_LOG`
/// is read, then [`DEFAULT_LEVEL`] applies.
pub fn init(level: Option<&str>) {
    let (filter, rejected) = build_filter(level);

    // A second init (tests) is harmless.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();

    if let Some(directive) = rejected {
        warn!(filter = %directive, fallback = DEFAULT_LEVEL, "Invalid log filter");
    }
}

/// The filter to install, plus the requested directive when it was rejected.
fn build_filter(level: Option<&str>) -> (EnvFilter, Option<String>) {
    let requested = level
        .map(str::to_string)
        .or_else(|| env::var(EnvFilter::DEFAULT_ENV).ok())
        .filter(|directive| !directive.trim().is_empty());

    match requested {
        None => (EnvFilter::new(DEFAULT_LEVEL), None),
        Some(directive) => match EnvFilter::try_new(&directive) {
            Ok(filter) => (filter, None),
            Err(_) => (EnvFilter::new(DEFAULT_LEVEL), Some(directive)),
        },
    }
}
