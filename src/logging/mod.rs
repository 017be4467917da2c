//! Logging system for the governance engine
//!
//! Structured logging over `tracing` with support for multiple output formats
//! (text, JSON, compact) and optional file logging.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use conflux_gov_rs::logging::{init_default_logging, init_logging, LoggingConfig, LogFormat};
//!
//! // Initialize with defaults (INFO level, text format)
//! init_default_logging();
//!
//! // Or configure logging explicitly
//! let config = LoggingConfig {
//!     debug: true,
//!     format: LogFormat::Json,
//!     ..Default::default()
//! };
//! init_logging(&config);
//! ```

use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Once;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Static initialization guard to ensure logging is only initialized once
static INIT: Once = Once::new();

/// Flag indicating whether logging has been initialized
static INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Guard for non-blocking file writer (must be kept alive for duration of program)
static mut FILE_GUARD: Option<WorkerGuard> = None;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable text format with timestamps
    #[default]
    Text,
    /// JSON format for structured logging and log aggregation
    Json,
    /// Compact format for development
    Compact,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Text => write!(f, "text"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Compact => write!(f, "compact"),
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            "compact" => Ok(LogFormat::Compact),
            _ => Err(format!(
                "Invalid log format '{}'. Valid options: text, json, compact",
                s
            )),
        }
    }
}

/// Logging configuration for the governance engine
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Enable debug-level logging (sets minimum level to DEBUG)
    pub debug: bool,
    /// Enable trace-level logging (sets minimum level to TRACE, overrides debug)
    pub trace: bool,
    /// Enable logging to file in addition to stdout
    pub record_log: bool,
    /// Directory for log files (supports ~ for home directory)
    pub logging_dir: String,
    /// Output format for log messages
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            trace: false,
            record_log: false,
            logging_dir: "~/.conflux-gov/logs".to_string(),
            format: LogFormat::Text,
        }
    }
}

impl LoggingConfig {
    /// Create a new LoggingConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable debug logging
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Enable file logging
    pub fn with_file_logging(mut self, enabled: bool) -> Self {
        self.record_log = enabled;
        self
    }

    /// Set the log format
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Load configuration from environment variables
    ///
    /// Supported environment variables:
    /// - `GOV_LOG_FORMAT`: Set format (text, json, compact)
    /// - `GOV_LOG_DIR`: Set logging directory (enables file logging)
    /// - `GOV_DEBUG` / `GOV_TRACE`: Enable debug/trace mode (any value)
    /// - `RUST_LOG`: Standard tracing filter (takes precedence if set)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if std::env::var("GOV_DEBUG").is_ok() || std::env::var("GOV_TRACE").is_ok() {
            config.debug = true;
        }

        if std::env::var("GOV_TRACE").is_ok() {
            config.trace = true;
        }

        if let Ok(format) = std::env::var("GOV_LOG_FORMAT") {
            if let Ok(f) = format.parse() {
                config.format = f;
            }
        }

        if let Ok(dir) = std::env::var("GOV_LOG_DIR") {
            config.logging_dir = dir;
            config.record_log = true;
        }

        config
    }

    /// Get the effective log level based on configuration
    fn get_level(&self) -> Level {
        if self.trace {
            Level::TRACE
        } else if self.debug {
            Level::DEBUG
        } else {
            Level::INFO
        }
    }

    /// Expand ~ to home directory in paths
    fn expand_path(&self) -> PathBuf {
        let path = &self.logging_dir;
        if let Some(stripped) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        }
        PathBuf::from(path)
    }
}

/// Initialize the logging system with the given configuration.
///
/// This function can only be called once; subsequent calls will be ignored.
pub fn init_logging(config: &LoggingConfig) {
    INIT.call_once(|| {
        init_logging_internal(config);
        INITIALIZED.store(true, Ordering::SeqCst);
    });
}

/// Initialize logging with default configuration (INFO level, text format).
pub fn init_default_logging() {
    init_logging(&LoggingConfig::default());
}

/// Check if logging has been initialized
pub fn is_initialized() -> bool {
    INITIALIZED.load(Ordering::SeqCst)
}

/// Internal initialization logic
fn init_logging_internal(config: &LoggingConfig) {
    // Allow RUST_LOG to override, otherwise use config-based level
    let env_filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = config.get_level();
        EnvFilter::new(format!("{},hyper=warn,reqwest=warn,h2=warn", level))
    };

    let file_appender = if config.record_log {
        let log_dir = config.expand_path();
        if let Err(e) = std::fs::create_dir_all(&log_dir) {
            eprintln!(
                "Warning: Failed to create log directory {:?}: {}",
                log_dir, e
            );
            None
        } else {
            let file_appender = tracing_appender::rolling::daily(&log_dir, "conflux-gov.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            // SAFETY: only called once via Once::call_once, so there's no race
            unsafe {
                FILE_GUARD = Some(guard);
            }
            Some(non_blocking)
        }
    } else {
        None
    };

    match config.format {
        LogFormat::Text => {
            if let Some(file_writer) = file_appender {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(io::stdout))
                    .with(fmt::layer().with_writer(file_writer).with_ansi(false))
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().with_writer(io::stdout))
                    .init();
            }
        }
        LogFormat::Json => {
            if let Some(file_writer) = file_appender {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json().with_writer(io::stdout))
                    .with(
                        fmt::layer()
                            .json()
                            .with_writer(file_writer)
                            .with_ansi(false),
                    )
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().json().with_writer(io::stdout))
                    .init();
            }
        }
        LogFormat::Compact => {
            if let Some(file_writer) = file_appender {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().compact().with_writer(io::stdout))
                    .with(
                        fmt::layer()
                            .compact()
                            .with_writer(file_writer)
                            .with_ansi(false),
                    )
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(fmt::layer().compact().with_writer(io::stdout))
                    .init();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_format_parsing() {
        assert_eq!("text".parse::<LogFormat>().unwrap(), LogFormat::Text);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Json);
        assert_eq!("compact".parse::<LogFormat>().unwrap(), LogFormat::Compact);
        assert!("yaml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_effective_level() {
        let config = LoggingConfig::new();
        assert_eq!(config.get_level(), Level::INFO);
        assert_eq!(config.clone().with_debug(true).get_level(), Level::DEBUG);

        let trace = LoggingConfig {
            trace: true,
            ..Default::default()
        };
        assert_eq!(trace.get_level(), Level::TRACE);
    }
}
