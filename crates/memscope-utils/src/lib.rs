//! # memscope Utilities
//!
//! Shared utilities for memscope hosts, mainly the logging bootstrap built on
//! `tracing`.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{dated_log_file, init_logging, init_logging_with, init_logging_with_level, LogFormat, LogLevel, LoggingConfig, LoggingError};
pub use tracing::{debug, error, info, trace, warn};
