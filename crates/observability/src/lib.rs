//! Tracing/logging setup shared by terminal binaries.

/// Initialize process-wide tracing.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(LogFormat::from_env());
}

/// Tracing subscriber configuration.
pub mod tracing;

pub use self::tracing::LogFormat;
