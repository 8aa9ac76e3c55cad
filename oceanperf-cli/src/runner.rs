//! Shared setup for commands: configuration, logging and controller wiring.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use oceanperf::config::ConfigFile;
use oceanperf::controller::AdaptivePerformanceController;
use oceanperf::logging::{self, LoggingGuard, LoggingOptions};
use oceanperf::store::{
    default_state_path, IniPreferenceStore, MemoryPreferenceStore, PreferenceStore, StateStore,
};
use tracing::{info, warn};

use crate::error::CliError;

/// Logging flags from the command line.
#[derive(Debug, Default)]
pub struct LogArgs {
    /// Mirror logs to stderr.
    pub verbose: bool,
    pub level: Option<String>,
    pub chrome_trace: Option<PathBuf>,
}

/// Loaded configuration plus the logging guard for one CLI invocation.
pub struct CliRunner {
    config: ConfigFile,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load `config.ini` and install logging.
    pub fn new(log: LogArgs) -> Result<Self, CliError> {
        let config = ConfigFile::load()?;
        let mut options = LoggingOptions::from_settings(&config.logging)
            .with_stderr(log.verbose)
            .with_chrome_trace(log.chrome_trace);
        if let Some(level) = log.level {
            options = options.with_level(level);
        }
        let guard = logging::init(&options)?;

        Ok(Self {
            config,
            _logging: guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            version = oceanperf::VERSION,
            command,
            log_dir = %self.config.logging.directory.display(),
            "oceanperf CLI started"
        );
    }

    /// Path of the persisted controller state.
    pub fn state_path(&self) -> Result<PathBuf, CliError> {
        default_state_path()
            .ok_or_else(|| CliError::Config("Could not determine home directory".to_string()))
    }

    /// Persisted state backed by the default state file.
    pub fn open_state(&self) -> Result<StateStore, CliError> {
        Ok(StateStore::new(open_store_at(&self.state_path()?)))
    }

    /// Controller over the persisted state, without background monitoring.
    pub fn controller(&self) -> Result<AdaptivePerformanceController, CliError> {
        Ok(AdaptivePerformanceController::builder()
            .with_settings(self.config.performance.clone())
            .with_store(open_store_at(&self.state_path()?))
            .without_runtime()
            .build())
    }
}

/// Open the state file, or an empty in-memory store if it cannot be read.
///
/// An unreadable state file is treated like a missing one: the controller
/// redetects, and nothing is written back to the broken file.
pub fn open_store_at(path: &Path) -> Arc<dyn PreferenceStore> {
    match IniPreferenceStore::open(path) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(
                path = %path.display(),
                error = %e,
                "State file unreadable, continuing with empty state"
            );
            Arc::new(MemoryPreferenceStore::new())
        }
    }
}
