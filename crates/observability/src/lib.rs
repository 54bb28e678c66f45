//! Tracing/logging setup shared by the binary and tests.

/// Initialize process-wide logging with JSON output.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::LogFormat::Json, tracing::DEFAULT_DIRECTIVE);
}

/// Initialize logging with the output format suited to `app_env`.
pub fn init_for_env(app_env: &str) {
    tracing::init(tracing::LogFormat::for_env(app_env), tracing::DEFAULT_DIRECTIVE);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
