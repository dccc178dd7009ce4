//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Output format for process logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Compact human-readable lines, for interactive runs.
    #[default]
    Plain,
    /// One JSON object per event, for log collection.
    Json,
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // Level configurable via RUST_LOG; defaults to info.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = match format {
        LogFormat::Plain => builder.compact().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
