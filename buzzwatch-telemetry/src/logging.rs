//! ## buzzwatch-telemetry::logging
//! **Leveled text logging on `tracing`**
//!
//! Everything goes to stderr; when a log directory is configured the same lines
//! are also written, without colour, to a file through a non-blocking appender.

use buzzwatch_config::TelemetryConfig;
use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Cannot open log file: {0}")]
    Appender(#[from] InitError),
    #[error("Global subscriber already installed: {0}")]
    Init(#[from] TryInitError),
}

/// Keeps the file writer alive; pending lines are flushed when dropped.
#[must_use = "dropping the guard stops file logging"]
pub struct LogGuard {
    _file: Option<WorkerGuard>,
}

#[derive(Clone)]
pub struct EventLogger;

impl EventLogger {
    /// Install the global subscriber. Call once, early in `main`.
    pub fn init(config: &TelemetryConfig) -> Result<LogGuard, LoggingError> {
        let stderr = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(config.ansi)
            .with_thread_names(true);

        let (file_layer, guard) = match &config.log_dir {
            Some(dir) => {
                let appender = RollingFileAppender::builder()
                    .rotation(Rotation::NEVER)
                    .filename_prefix(&config.log_file)
                    .build(dir)?;
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = fmt::layer().with_writer(writer).with_ansi(false);
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };

        tracing_subscriber::registry()
            .with(env_filter(&config.log_level))
            .with(stderr)
            .with(file_layer)
            .try_init()?;

        Ok(LogGuard { _file: guard })
    }
}

/// `RUST_LOG` wins; otherwise the configured directive.
fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_directive_is_used() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let filter = env_filter("warn,buzzwatch_engine=debug");
        let rendered = filter.to_string();
        assert!(rendered.contains("warn"));
        assert!(rendered.contains("buzzwatch_engine=debug"));
    }

    #[test]
    fn unwritable_log_dir_is_an_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let config = TelemetryConfig {
            log_dir: Some(file.path().join("logs")),
            ..TelemetryConfig::default()
        };
        assert!(matches!(
            EventLogger::init(&config),
            Err(LoggingError::Appender(_))
        ));
    }
}
