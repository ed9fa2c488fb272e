//! Logging setup for the CLI
//!
//! Stderr always gets a compact formatter. A daily rolling log file is added
//! when `U64_LOG_FILE` is set.

use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Default log level when `RUST_LOG` does not override it
    pub level: Level,

    /// Also log to this file (rotated daily)
    pub file_path: Option<PathBuf>,

    /// Include timestamps
    pub timestamps: bool,

    /// Colored stderr output
    pub ansi: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            file_path: None,
            timestamps: true,
            ansi: true,
        }
    }
}

impl LogConfig {
    /// Create config from environment
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(rust_log) = std::env::var("RUST_LOG") {
            config.level = level_from_directive(&rust_log).unwrap_or(config.level);
        }

        if let Ok(log_file) = std::env::var("U64_LOG_FILE") {
            if !log_file.trim().is_empty() {
                config.file_path = Some(PathBuf::from(log_file));
            }
        }

        if std::env::var_os("NO_COLOR").is_some() {
            config.ansi = false;
        }

        config
    }

    /// Lower the default level to debug when `verbose` is set
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        if verbose && self.level < Level::DEBUG {
            self.level = Level::DEBUG;
        }
        self
    }
}

fn level_from_directive(directive: &str) -> Option<Level> {
    let directive = directive.to_lowercase();
    ["trace", "debug", "info", "warn", "error"]
        .into_iter()
        .find(|name| directive.contains(name))
        .and_then(|name| name.parse().ok())
}

/// Initialize logging with the given configuration
///
/// The returned guard flushes the file writer on drop and must be held for
/// the lifetime of the process.
pub fn init_logging(
    config: &LogConfig,
) -> std::result::Result<Option<WorkerGuard>, Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(config.level.into())
        .from_env_lossy();

    let stderr_layer = fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(config.ansi)
        .with_target(false);

    let (file_layer, guard) = match &config.file_path {
        Some(file_path) => {
            let directory = file_path.parent().unwrap_or_else(|| Path::new("."));
            std::fs::create_dir_all(directory)?;

            let file_name = file_path
                .file_name()
                .unwrap_or_else(|| std::ffi::OsStr::new("u64-remote.log"));
            let appender = tracing_appender::rolling::daily(directory, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer);

    if config.timestamps {
        tracing::subscriber::set_global_default(registry.with(stderr_layer))?;
    } else {
        tracing::subscriber::set_global_default(registry.with(stderr_layer.without_time()))?;
    }

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_from_env_reads_level_and_file() {
        temp_env::with_vars(
            [
                ("RUST_LOG", Some("u64_remote=trace")),
                ("U64_LOG_FILE", Some("/tmp/u64-remote/test.log")),
            ],
            || {
                let config = LogConfig::from_env();
                assert_eq!(config.level, Level::TRACE);
                assert_eq!(
                    config.file_path,
                    Some(PathBuf::from("/tmp/u64-remote/test.log"))
                );
            },
        );
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        temp_env::with_vars_unset(["RUST_LOG", "U64_LOG_FILE"], || {
            let config = LogConfig::from_env();
            assert_eq!(config.level, Level::INFO);
            assert!(config.file_path.is_none());
        });
    }

    #[test]
    fn test_verbose_never_raises_level() {
        let config = LogConfig::default().with_verbose(true);
        assert_eq!(config.level, Level::DEBUG);

        let trace = LogConfig {
            level: Level::TRACE,
            ..LogConfig::default()
        }
        .with_verbose(true);
        assert_eq!(trace.level, Level::TRACE);
    }
}
