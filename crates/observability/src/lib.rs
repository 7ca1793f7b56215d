//! Tracing/logging setup shared by the service binaries.

/// Initialize process-wide logging for `service_name`.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(service_name: &str) {
    tracing::init(service_name);
}

/// Tracing configuration (filters, layers, output format).
pub mod tracing;

pub use self::tracing::LogFormat;
