//! CLI error type.

use std::fmt;

use oceanperf::config::ConfigError;
use oceanperf::controller::BenchmarkError;
use oceanperf::logging::LoggingError;
use oceanperf::store::StoreError;

/// Errors surfaced to the user by the `oceanperf` binary.
#[derive(Debug)]
pub enum CliError {
    /// Invalid arguments or unusable configuration.
    Config(String),
    /// The configuration file could not be loaded or saved.
    ConfigFile(ConfigError),
    /// The persisted controller state could not be read or written.
    Store(StoreError),
    /// Logging could not be initialized.
    Logging(LoggingError),
    /// The benchmark did not produce a report.
    Benchmark(BenchmarkError),
    /// The async runtime could not be started.
    Runtime(std::io::Error),
    /// Output could not be encoded.
    Json(serde_json::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "{}", msg),
            CliError::ConfigFile(e) => write!(f, "Configuration error: {}", e),
            CliError::Store(e) => write!(f, "State error: {}", e),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::Benchmark(e) => write!(f, "Benchmark error: {}", e),
            CliError::Runtime(e) => write!(f, "Failed to start runtime: {}", e),
            CliError::Json(e) => write!(f, "Failed to encode JSON: {}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Config(_) => None,
            CliError::ConfigFile(e) => Some(e),
            CliError::Store(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::Benchmark(e) => Some(e),
            CliError::Runtime(e) => Some(e),
            CliError::Json(e) => Some(e),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        CliError::Store(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<BenchmarkError> for CliError {
    fn from(e: BenchmarkError) -> Self {
        CliError::Benchmark(e)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Json(e)
    }
}
