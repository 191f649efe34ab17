//! Structured logging for Beacon services with `tracing`.

pub mod init;

// Re-export tracing macros for convenience
pub use tracing::{Span, debug, error, info, instrument, trace, warn};

pub use init::init_telemetry;
