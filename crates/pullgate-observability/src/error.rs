//! Error types for observability setup

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ObservabilityError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Invalid log filter: {0}")]
    Filter(String),
}

pub type Result<T> = std::result::Result<T, ObservabilityError>;
