//! Logging and observability.
//!
//! Production logging via the tracing ecosystem. While a TUI session owns
//! the terminal, stderr output is suppressed and file logging is the only
//! place events go.
//!
//! # Environment Variables
//!
//! - `SYMPOSIUM_LOG`: Filter directive (like `RUST_LOG`), e.g., `symposium=debug`
//! - `SYMPOSIUM_LOG_FORMAT`: Output format for stderr: `pretty`, `json`, `compact`
//! - `SYMPOSIUM_LOG_DIR`: Override the log directory (default `~/.symposium/logs`)

use crate::Error;
use crate::config::LoggingSettings;
use std::env;
use std::io;
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Log output format for stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Pretty, human-readable output with colors
    #[default]
    Pretty,
    /// JSON output (one line per event)
    Json,
    /// Compact, single-line output
    Compact,
}

impl LogFormat {
    /// Parse a log format from a string.
    pub fn parse_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(LogFormat::Pretty),
            "json" => Some(LogFormat::Json),
            "compact" => Some(LogFormat::Compact),
            _ => None,
        }
    }

    /// Get the string representation of this format.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
            LogFormat::Compact => "compact",
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default log level for output.
    pub level: String,
    /// Output format for stderr.
    pub format: LogFormat,
    /// Suppress stderr output entirely (TUI sessions).
    pub quiet_stderr: bool,
    /// Write JSON logs to a file.
    pub file: bool,
    /// Log directory override.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::default(),
            quiet_stderr: false,
            file: false,
            directory: None,
        }
    }
}

impl From<LoggingSettings> for LoggingConfig {
    fn from(settings: LoggingSettings) -> Self {
        Self {
            level: settings.level,
            format: LogFormat::default(),
            quiet_stderr: false,
            file: settings.file,
            directory: settings.directory,
        }
    }
}

impl LoggingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the log level.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Suppress stderr output; only file logging remains active.
    pub fn with_quiet_stderr(mut self) -> Self {
        self.quiet_stderr = true;
        self
    }

    /// Enable file logging.
    pub fn with_file_logging(mut self) -> Self {
        self.file = true;
        self
    }

    /// Build an EnvFilter from this config and environment variables.
    fn build_env_filter(&self) -> EnvFilter {
        let filter = env::var("SYMPOSIUM_LOG")
            .ok()
            .or_else(|| env::var("RUST_LOG").ok())
            .unwrap_or_else(|| self.level.clone());

        EnvFilter::new(filter)
    }

    /// Determine the format for stderr output.
    fn detect_format(&self) -> LogFormat {
        if let Ok(fmt_str) = env::var("SYMPOSIUM_LOG_FORMAT")
            && let Some(fmt) = LogFormat::parse_str(&fmt_str)
        {
            return fmt;
        }

        self.format
    }

    /// Get the log directory path.
    fn log_dir(&self) -> Result<PathBuf, Error> {
        if let Ok(custom_dir) = env::var("SYMPOSIUM_LOG_DIR") {
            return Ok(PathBuf::from(custom_dir));
        }

        if let Some(dir) = &self.directory {
            return Ok(dir.clone());
        }

        let home = env::var("HOME")
            .or_else(|_| env::var("USERPROFILE"))
            .map_err(|_| Error::Config("could not determine home directory for logs".to_string()))?;

        Ok(PathBuf::from(home).join(".symposium").join("logs"))
    }
}

/// Initialize the global tracing subscriber.
///
/// Returns the file appender's worker guard when file logging is enabled;
/// the guard must be kept alive for the duration of the session or buffered
/// events are lost.
pub fn init_logging(config: Option<LoggingConfig>) -> Result<Option<WorkerGuard>, Error> {
    let config = config.unwrap_or_default();
    let env_filter = config.build_env_filter();
    let format = config.detect_format();

    let registry = Registry::default().with(env_filter);

    let (file_layer, guard) = if config.file {
        let log_dir = config.log_dir()?;
        std::fs::create_dir_all(&log_dir)
            .map_err(|e| Error::Config(format!("failed to create log directory: {}", e)))?;

        let file_appender = tracing_appender::rolling::daily(log_dir, "symposium.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (Some(fmt::layer().json().with_writer(non_blocking)), Some(guard))
    } else {
        (None, None)
    };

    let registry = registry.with(file_layer);

    if config.quiet_stderr {
        registry.init();
        return Ok(guard);
    }

    match format {
        LogFormat::Pretty => {
            registry
                .with(fmt::layer().pretty().with_writer(io::stderr).with_ansi(true))
                .init();
        }
        LogFormat::Json => {
            registry.with(fmt::layer().json().with_writer(io::stderr)).init();
        }
        LogFormat::Compact => {
            registry.with(fmt::layer().compact().with_writer(io::stderr)).init();
        }
    }

    Ok(guard)
}
