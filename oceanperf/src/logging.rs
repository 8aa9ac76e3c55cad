//! Logging setup.
//!
//! Call [`init`] once at startup and keep the returned guard alive; dropping
//! it flushes the background file writer.
//!
//! Output goes to a daily rolling file (`<directory>/oceanperf.log.YYYY-MM-DD`)
//! and optionally to stderr. `RUST_LOG` takes precedence over the configured
//! level. With the `profiling` feature a Chrome trace can be written as well.

use std::path::{Path, PathBuf};

use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::OffsetTime;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingSettings;

/// File name prefix for rolling log files.
pub const LOG_FILE_PREFIX: &str = "oceanperf.log";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid log filter {filter:?}: {message}")]
    Filter { filter: String, message: String },

    #[error("a global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}

/// Logging options.
#[derive(Debug, Clone)]
pub struct LoggingOptions {
    pub directory: PathBuf,
    /// Filter used when `RUST_LOG` is unset.
    pub level: String,
    /// Also log to stderr.
    pub stderr: bool,
    /// Write a Chrome trace here (`profiling` feature only).
    pub chrome_trace: Option<PathBuf>,
}

impl LoggingOptions {
    pub fn from_settings(settings: &LoggingSettings) -> Self {
        Self {
            directory: settings.directory.clone(),
            level: settings.level.clone(),
            stderr: false,
            chrome_trace: None,
        }
    }

    pub fn with_stderr(mut self, stderr: bool) -> Self {
        self.stderr = stderr;
        self
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    pub fn with_chrome_trace(mut self, path: Option<PathBuf>) -> Self {
        self.chrome_trace = path;
        self
    }
}

/// Keeps background writers alive.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: WorkerGuard,
    #[cfg(feature = "profiling")]
    _chrome: Option<tracing_chrome::FlushGuard>,
}

impl std::fmt::Debug for LoggingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingGuard").finish_non_exhaustive()
    }
}

/// Build the level filter: `RUST_LOG` if set, else `default_filter`.
pub fn build_filter(default_filter: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(default_filter).map_err(|e| LoggingError::Filter {
        filter: default_filter.to_string(),
        message: e.to_string(),
    })
}

/// Create the log directory if needed.
pub fn prepare_directory(directory: &Path) -> Result<(), LoggingError> {
    std::fs::create_dir_all(directory).map_err(|source| LoggingError::CreateDir {
        path: directory.to_path_buf(),
        source,
    })
}

fn local_timer() -> OffsetTime<Rfc3339> {
    // Local offset is unavailable on some platforms once threads exist.
    OffsetTime::local_rfc_3339().unwrap_or_else(|_| OffsetTime::new(time::UtcOffset::UTC, Rfc3339))
}

/// Install the global subscriber.
pub fn init(options: &LoggingOptions) -> Result<LoggingGuard, LoggingError> {
    prepare_directory(&options.directory)?;
    let filter = build_filter(&options.level)?;

    let appender = tracing_appender::rolling::daily(&options.directory, LOG_FILE_PREFIX);
    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_timer(local_timer());

    let stderr_layer = options.stderr.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_timer(local_timer())
    });

    let registry = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stderr_layer);

    #[cfg(feature = "profiling")]
    {
        let (chrome_layer, chrome_guard) = match &options.chrome_trace {
            Some(path) => {
                let (layer, guard) = tracing_chrome::ChromeLayerBuilder::new()
                    .file(path)
                    .include_args(true)
                    .build();
                (Some(layer), Some(guard))
            }
            None => (None, None),
        };
        registry
            .with(chrome_layer)
            .try_init()
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

        Ok(LoggingGuard {
            _file: file_guard,
            _chrome: chrome_guard,
        })
    }

    #[cfg(not(feature = "profiling"))]
    {
        if options.chrome_trace.is_some() {
            tracing::warn!("Chrome tracing requested but the profiling feature is disabled");
        }
        registry
            .try_init()
            .map_err(|e| LoggingError::AlreadyInitialized(e.to_string()))?;

        Ok(LoggingGuard { _file: file_guard })
    }
}
