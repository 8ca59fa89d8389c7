//! PullGate observability
//!
//! Structured logging with pretty, JSON or compact console output and an
//! optional rotated JSON log file.
//!
//! ```no_run
//! use pullgate_observability::{init_logging, LoggingConfig};
//!
//! let _guard = init_logging(&LoggingConfig::default()).expect("logging");
//! tracing::info!("pullgate starting");
//! ```

pub mod config;
pub mod error;
pub mod logging;

pub use config::{FileLoggingConfig, LogFormat, LogLevel, LoggingConfig, RotationStrategy};
pub use error::{ObservabilityError, Result};
pub use logging::{init_logging, LogGuard};
