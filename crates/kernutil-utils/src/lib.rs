//! # kernutil Utilities
//!
//! Shared utilities for the kernutil binary: logging built on `tracing`, and
//! environment-driven configuration.

pub mod config;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::{ConfigError, Settings};
pub use logging::{init_logging, LogFormat, LogLevel, LoggingError};
pub use tracing::{debug, error, info, trace, warn};
