//! Subscriber setup for console and file logging

use std::io;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::config::{FileLoggingConfig, LogFormat, LoggingConfig, RotationStrategy};
use crate::error::{ObservabilityError, Result};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Keeps the background file writer alive; drop it last.
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `filter_directives`, which wins over `level`.
pub fn init_logging(config: &LoggingConfig) -> Result<LogGuard> {
    let filter = build_filter(config)?;

    let mut layers: Vec<BoxedLayer> = vec![console_layer(config)];

    let guard = match &config.file {
        Some(file_config) => {
            let (writer, guard) = file_writer(file_config);
            layers.push(file_layer(config, writer));
            Some(guard)
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init()
        .map_err(|e| ObservabilityError::LoggingInit(e.to_string()))?;

    Ok(LogGuard { _guard: guard })
}

fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }

    let directives = config
        .filter_directives
        .as_deref()
        .unwrap_or_else(|| config.level.as_directive());

    EnvFilter::try_new(directives).map_err(|e| ObservabilityError::Filter(e.to_string()))
}

fn console_layer(config: &LoggingConfig) -> BoxedLayer {
    let layer = fmt::layer()
        .with_writer(io::stdout)
        .with_target(config.include_target)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_span_events(FmtSpan::CLOSE);

    match config.format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    }
}

fn file_layer(config: &LoggingConfig, writer: NonBlocking) -> BoxedLayer {
    fmt::layer()
        .with_writer(writer)
        .with_target(config.include_target)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_ansi(false)
        .json()
        .boxed()
}

fn file_writer(config: &FileLoggingConfig) -> (NonBlocking, WorkerGuard) {
    let appender = match config.rotation {
        RotationStrategy::Daily => tracing_appender::rolling::daily(&config.directory, &config.prefix),
        RotationStrategy::Hourly => {
            tracing_appender::rolling::hourly(&config.directory, &config.prefix)
        }
        RotationStrategy::Never => tracing_appender::rolling::never(&config.directory, &config.prefix),
    };

    tracing_appender::non_blocking(appender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogLevel;

    #[test]
    fn test_filter_from_level() {
        let config = LoggingConfig {
            level: LogLevel::Warn,
            ..Default::default()
        };
        assert!(build_filter(&config).is_ok());
    }

    #[test]
    fn test_filter_from_directives() {
        let config = LoggingConfig {
            filter_directives: Some("pullgate_api=debug,tower_http=info".to_string()),
            ..Default::default()
        };
        assert!(build_filter(&config).is_ok());
    }

    #[test]
    fn test_log_guard_without_file() {
        let guard = LogGuard { _guard: None };
        assert!(guard._guard.is_none());
    }
}
