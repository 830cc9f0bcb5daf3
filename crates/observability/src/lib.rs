//! Tracing/logging setup shared by the seeding binaries.

/// Initialize process-wide logging in the given format.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(format: LogFormat) {
    tracing::init(format);
}

/// Tracing configuration (filters, formatters).
pub mod tracing;

pub use tracing::LogFormat;
