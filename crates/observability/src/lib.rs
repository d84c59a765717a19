//! Tracing/logging setup shared by every binary in the workspace.

/// Tracing subscriber configuration and initialisation.
pub mod tracing;

pub use crate::tracing::{LogConfig, LogFormat, ParseLogFormatError};

/// Initialize process-wide tracing/logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init(config: &LogConfig) {
    crate::tracing::init(config);
}
