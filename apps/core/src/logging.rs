use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "launchbar.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create logs dir: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),
    #[error("a global subscriber is already installed")]
    AlreadyInstalled,
}

pub fn logs_dir() -> PathBuf {
    crate::config::stable_app_data_dir().join("logs")
}

/// Installs the global subscriber writing to a daily rolling file.
///
/// Keep the returned guard alive for as long as logs should be flushed.
pub fn init(cfg: &Config) -> Result<WorkerGuard, LoggingError> {
    let dir = logs_dir();
    std::fs::create_dir_all(&dir)?;
    let filter = EnvFilter::try_new(cfg.log_filter.trim())?;

    let appender = tracing_appender::rolling::daily(&dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInstalled)?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::{init, logs_dir, LoggingError};
    use crate::config::Config;

    #[test]
    fn logs_dir_uses_stable_app_data_layout() {
        let dir = logs_dir();
        assert!(dir
            .to_string_lossy()
            .to_ascii_lowercase()
            .contains("launchbar"));
    }

    #[test]
    fn rejects_invalid_log_filter() {
        let cfg = Config {
            log_filter: "launchbar_core=loud".to_string(),
            ..Default::default()
        };
        assert!(matches!(init(&cfg), Err(LoggingError::Filter(_))));
    }
}
