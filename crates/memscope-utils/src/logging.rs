//! # Logging Utilities
//!
//! Logging bootstrap for memscope hosts, built on `tracing`.
//!
//! The core engine only emits events through the `tracing` macros; whoever
//! embeds it (the CLI, a debugger plugin, a test harness) decides where those
//! events go by calling one of the initializers here.
//!
//! ## Environment Variables
//!
//! - `RUST_LOG`: Filter directives (e.g., `RUST_LOG=debug`, `RUST_LOG=memscope_core=trace`)
//! - `MEMSCOPE_LOG_FORMAT`: Output format (`json` or `pretty`, default: `pretty`)
//! - `MEMSCOPE_LOG_FILE`: Optional path of a daily-rolled log file. When it
//!   names an existing directory, events go to `<dir>/<YYYY-MM-DD>-memscope.log`
//!
//! ## Example
//!
//! ```rust,no_run
//! use memscope_utils::{LogFormat, LogLevel, LoggingConfig};
//!
//! let config = LoggingConfig::from_env().with_level(LogLevel::Debug).with_format(LogFormat::Json);
//! memscope_utils::init_logging_with(&config).expect("Failed to initialize logging");
//! tracing::debug!("decoder registry ready");
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::{env, io};

use chrono::Utc;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::ChronoUtc;
use tracing_subscriber::fmt::{self};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Environment variable selecting the output format.
pub const LOG_FORMAT_ENV: &str = "MEMSCOPE_LOG_FORMAT";

/// Environment variable naming an optional log file.
pub const LOG_FILE_ENV: &str = "MEMSCOPE_LOG_FILE";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat
{
    /// Pretty-printed, human-readable format
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

impl FromStr for LogFormat
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "pretty" | "text" | "human" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(LoggingError::InvalidFormat(format!("{s} (expected 'pretty' or 'json')"))),
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum LogLevel
{
    /// Error level
    Error,
    /// Warning level (default; malformed containers are reported here)
    #[default]
    Warn,
    /// Info level
    Info,
    /// Debug level (dispatch decisions)
    Debug,
    /// Trace level (every tree node visited)
    Trace,
}

impl From<LogLevel> for Level
{
    fn from(level: LogLevel) -> Self
    {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

impl FromStr for LogLevel
{
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "error" | "err" => Ok(LogLevel::Error),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" | "dbg" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(LoggingError::InvalidLevel(format!(
                "{s} (expected 'error', 'warn', 'info', 'debug', or 'trace')"
            ))),
        }
    }
}

/// Resolved logging settings.
///
/// An explicit level always wins over `RUST_LOG`; without one, `RUST_LOG`
/// directives are used verbatim and the default level applies otherwise.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig
{
    /// Explicit level (from a CLI flag), overriding `RUST_LOG`
    pub level: Option<LogLevel>,
    /// Output format
    pub format: LogFormat,
    /// Optional file receiving a copy of every event
    pub file: Option<PathBuf>,
}

impl LoggingConfig
{
    /// Read format and file from the environment. The level is left unset so
    /// that `RUST_LOG` keeps control unless a caller overrides it.
    #[must_use]
    pub fn from_env() -> Self
    {
        let format = env::var(LOG_FORMAT_ENV)
            .ok()
            .and_then(|s| LogFormat::from_str(&s).ok())
            .unwrap_or_default();
        let file = env::var(LOG_FILE_ENV).ok().filter(|s| !s.is_empty()).map(PathBuf::from);

        Self {
            level: None,
            format,
            file,
        }
    }

    /// Set an explicit level.
    #[must_use]
    pub fn with_level(mut self, level: LogLevel) -> Self
    {
        self.level = Some(level);
        self
    }

    /// Set the output format.
    #[must_use]
    pub fn with_format(mut self, format: LogFormat) -> Self
    {
        self.format = format;
        self
    }

    fn filter(&self) -> EnvFilter
    {
        if let Some(level) = self.level {
            return EnvFilter::new(Level::from(level).to_string());
        }
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(Level::from(LogLevel::default()).to_string()))
    }
}

/// Initialize logging from the environment.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging() -> Result<Option<WorkerGuard>, LoggingError>
{
    init_logging_with(&LoggingConfig::from_env())
}

/// Initialize logging with an explicit level and format, console only.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with_level(level: LogLevel, format: LogFormat) -> Result<Option<WorkerGuard>, LoggingError>
{
    let config = LoggingConfig {
        level: Some(level),
        format,
        file: None,
    };
    init_logging_with(&config)
}

/// Initialize logging from a resolved configuration.
///
/// Console output goes to stderr so that rendered trees on stdout stay clean.
/// When a file is configured the returned guard must be kept alive for the
/// lifetime of the program, otherwise buffered events are lost.
///
/// ## Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging_with(config: &LoggingConfig) -> Result<Option<WorkerGuard>, LoggingError>
{
    let mut layers: Vec<BoxedLayer> = vec![console_layer(config.format).with_filter(config.filter()).boxed()];
    let mut guard = None;

    if let Some(path) = &config.file {
        let (file, file_guard) = file_layer(path, config.format);
        layers.push(file.with_filter(config.filter()).boxed());
        guard = Some(file_guard);
    }

    Registry::default()
        .with(layers)
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))?;
    Ok(guard)
}

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

fn console_layer(format: LogFormat) -> BoxedLayer
{
    let layer = fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(io::stderr);

    match format {
        LogFormat::Pretty => layer.with_ansi(true).boxed(),
        LogFormat::Json => layer.json().with_current_span(true).with_span_list(true).boxed(),
    }
}

/// `<directory>/<YYYY-MM-DD>-memscope.log` for today's date (UTC).
#[must_use]
pub fn dated_log_file(directory: &Path) -> PathBuf
{
    let today = Utc::now().format("%Y-%m-%d");
    directory.join(format!("{today}-memscope.log"))
}

fn file_layer(path: &Path, format: LogFormat) -> (BoxedLayer, WorkerGuard)
{
    let appender = if path.is_dir() {
        // the date is already part of the name
        let dated = dated_log_file(path);
        tracing_appender::rolling::never(path, dated.file_name().unwrap_or_default())
    } else {
        let directory = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
        tracing_appender::rolling::daily(directory, path.file_name().unwrap_or_default())
    };
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .with_writer(writer)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_timer(ChronoUtc::rfc_3339())
        .with_ansi(false);

    let layer = match format {
        LogFormat::Pretty => layer.boxed(),
        LogFormat::Json => layer.json().with_current_span(true).with_span_list(true).boxed(),
    };
    (layer, guard)
}

/// Logging initialization error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError
{
    /// Invalid log format
    #[error("Invalid log format: {0}")]
    InvalidFormat(String),

    /// Invalid log level
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    /// Failed to initialize logging
    #[error("Failed to initialize logging: {0}")]
    InitializationFailed(String),
}
