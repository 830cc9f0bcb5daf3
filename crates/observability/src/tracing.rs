//! Tracing/logging initialization.

use core::str::FromStr;

use tracing_subscriber::EnvFilter;

/// Output format of the log stream.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event (machine-readable, the default).
    #[default]
    Json,
    /// Human-readable lines for interactive runs.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" | "text" => Ok(LogFormat::Pretty),
            other => Err(format!("unknown log format `{other}` (expected json or pretty)")),
        }
    }
}

/// Initialize tracing/logging for the process, filtered via `RUST_LOG`
/// (default `info`).
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init(),
    };
}
