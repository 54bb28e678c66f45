//! Tracing/logging initialization.
//!
//! `RUST_LOG` always wins over the default directive.

use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset or unparseable.
pub const DEFAULT_DIRECTIVE: &str = "info";

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line.
    Json,
    /// Human-readable single-line output for local development.
    Compact,
}

impl LogFormat {
    /// `dev` and `test` get compact logs; every other environment gets JSON.
    pub fn for_env(app_env: &str) -> Self {
        match app_env.trim().to_ascii_lowercase().as_str() {
            "dev" | "development" | "test" => LogFormat::Compact,
            _ => LogFormat::Json,
        }
    }
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init(format: LogFormat, default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false);

    let _ = match format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
}
