//! Configuration file handling.
//!
//! Settings live in `~/.oceanperf/config.ini`:
//!
//! ```ini
//! [controller]
//! evaluation_interval_secs = 3
//! redetect_after_hours = 24
//! auto_adjust_default = true
//!
//! [sampler]
//! capacity = 200
//! evaluation_window = 10
//!
//! [crisis]
//! cooldown_secs = 10
//! hysteresis_window_secs = 15
//!
//! [logging]
//! directory = ~/.oceanperf/logs
//! level = info
//! ```
//!
//! A missing file or key uses the default. A present but malformed value is
//! an error rather than a silent fallback.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use crate::controller::constants::{
    DEFAULT_CRISIS_COOLDOWN, DEFAULT_EVALUATION_INTERVAL, DEFAULT_EVALUATION_WINDOW,
    DEFAULT_HYSTERESIS_WINDOW, DEFAULT_REDETECT_AFTER,
};
use crate::sampler::DEFAULT_SAMPLE_CAPACITY;

/// Name of the data directory under the user's home.
pub const DATA_DIR_NAME: &str = ".oceanperf";

/// Name of the configuration file inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.ini";

/// Default log level filter.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors from loading or saving the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value for {section}.{key}: {value:?} ({reason})")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not determine home directory")]
    NoHomeDirectory,
}

/// `~/.oceanperf`, or `None` when no home directory is known.
pub fn data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DATA_DIR_NAME))
}

/// `~/.oceanperf/config.ini`.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    data_dir()
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .ok_or(ConfigError::NoHomeDirectory)
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    } else if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

/// Tuning for the adaptive performance controller.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceSettings {
    /// Time between monitoring ticks.
    pub evaluation_interval: Duration,

    /// Age after which the stored detection is repeated.
    pub redetect_after: Duration,

    /// Auto-adjust state when nothing is persisted yet.
    pub auto_adjust_default: bool,

    /// Frame sample ring buffer capacity.
    pub sample_capacity: usize,

    /// Samples averaged per tick.
    pub evaluation_window: usize,

    /// Minimum time between crisis downgrades.
    pub crisis_cooldown: Duration,

    /// How long reversal thresholds stay shifted after a change.
    pub hysteresis_window: Duration,
}

impl Default for PerformanceSettings {
    fn default() -> Self {
        Self {
            evaluation_interval: DEFAULT_EVALUATION_INTERVAL,
            redetect_after: DEFAULT_REDETECT_AFTER,
            auto_adjust_default: true,
            sample_capacity: DEFAULT_SAMPLE_CAPACITY,
            evaluation_window: DEFAULT_EVALUATION_WINDOW,
            crisis_cooldown: DEFAULT_CRISIS_COOLDOWN,
            hysteresis_window: DEFAULT_HYSTERESIS_WINDOW,
        }
    }
}

/// Where and how verbosely to log.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Directory for rolling log files.
    pub directory: PathBuf,

    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: data_dir()
                .map(|dir| dir.join("logs"))
                .unwrap_or_else(|| PathBuf::from("logs")),
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

/// Parsed configuration file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub performance: PerformanceSettings,
    pub logging: LoggingSettings,
}

impl ConfigFile {
    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path()?)
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Read {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(parse) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: parse.to_string(),
            },
        })?;

        Self::from_ini(&ini)
    }

    /// Build from an already parsed document.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let perf = &mut config.performance;

        if let Some(secs) = parse_positive::<u64>(ini, "controller", "evaluation_interval_secs")? {
            perf.evaluation_interval = Duration::from_secs(secs);
        }
        if let Some(hours) = parse_positive::<u64>(ini, "controller", "redetect_after_hours")? {
            let secs = hours.checked_mul(60 * 60).ok_or(ConfigError::InvalidValue {
                section: "controller",
                key: "redetect_after_hours",
                value: hours.to_string(),
                reason: "too large",
            })?;
            perf.redetect_after = Duration::from_secs(secs);
        }
        if let Some(enabled) = parse_value::<bool>(ini, "controller", "auto_adjust_default")? {
            perf.auto_adjust_default = enabled;
        }

        if let Some(capacity) = parse_positive::<usize>(ini, "sampler", "capacity")? {
            perf.sample_capacity = capacity;
        }
        if let Some(window) = parse_positive::<usize>(ini, "sampler", "evaluation_window")? {
            perf.evaluation_window = window;
        }

        if let Some(secs) = parse_value::<u64>(ini, "crisis", "cooldown_secs")? {
            perf.crisis_cooldown = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_value::<u64>(ini, "crisis", "hysteresis_window_secs")? {
            perf.hysteresis_window = Duration::from_secs(secs);
        }

        if let Some(dir) = raw_value(ini, "logging", "directory") {
            config.logging.directory = expand_tilde(dir);
        }
        if let Some(level) = raw_value(ini, "logging", "level") {
            config.logging.level = level.to_string();
        }

        if perf.evaluation_window > perf.sample_capacity {
            return Err(ConfigError::InvalidValue {
                section: "sampler",
                key: "evaluation_window",
                value: perf.evaluation_window.to_string(),
                reason: "must not exceed sampler.capacity",
            });
        }

        Ok(config)
    }

    /// Render as an INI document.
    pub fn to_ini(&self) -> Ini {
        let perf = &self.performance;
        let mut ini = Ini::new();
        ini.with_section(Some("controller"))
            .set(
                "evaluation_interval_secs",
                perf.evaluation_interval.as_secs().to_string(),
            )
            .set(
                "redetect_after_hours",
                (perf.redetect_after.as_secs() / 3600).to_string(),
            )
            .set("auto_adjust_default", perf.auto_adjust_default.to_string());
        ini.with_section(Some("sampler"))
            .set("capacity", perf.sample_capacity.to_string())
            .set("evaluation_window", perf.evaluation_window.to_string());
        ini.with_section(Some("crisis"))
            .set("cooldown_secs", perf.crisis_cooldown.as_secs().to_string())
            .set(
                "hysteresis_window_secs",
                perf.hysteresis_window.as_secs().to_string(),
            );
        ini.with_section(Some("logging"))
            .set("directory", self.logging.directory.display().to_string())
            .set("level", self.logging.level.clone());
        ini
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path()?)
    }

    /// Save to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        self.to_ini()
            .write_to_file(path)
            .map_err(|source| ConfigError::Write {
                path: path.to_path_buf(),
                source,
            })
    }
}

fn raw_value<'a>(ini: &'a Ini, section: &str, key: &str) -> Option<&'a str> {
    ini.get_from(Some(section), key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn parse_value<T: FromStr>(
    ini: &Ini,
    section: &'static str,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    match raw_value(ini, section, key) {
        Some(raw) => raw.parse().map(Some).map_err(|_| ConfigError::InvalidValue {
            section,
            key,
            value: raw.to_string(),
            reason: "not a valid value",
        }),
        None => Ok(None),
    }
}

fn parse_positive<T: FromStr + PartialEq + Default>(
    ini: &Ini,
    section: &'static str,
    key: &'static str,
) -> Result<Option<T>, ConfigError> {
    let value = parse_value::<T>(ini, section, key)?;
    if value.as_ref() == Some(&T::default()) {
        return Err(ConfigError::InvalidValue {
            section,
            key,
            value: "0".to_string(),
            reason: "must be greater than zero",
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let temp = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp.path().join("absent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
        assert_eq!(config.performance.evaluation_interval, Duration::from_secs(3));
        assert_eq!(config.performance.sample_capacity, 200);
    }

    #[test]
    fn test_partial_file_overrides_only_given_keys() {
        let file = write_config(
            "[controller]\nevaluation_interval_secs = 5\n\n[crisis]\ncooldown_secs = 20\n",
        );
        let config = ConfigFile::load_from(file.path()).unwrap();
        let perf = &config.performance;
        assert_eq!(perf.evaluation_interval, Duration::from_secs(5));
        assert_eq!(perf.crisis_cooldown, Duration::from_secs(20));
        assert_eq!(perf.redetect_after, DEFAULT_REDETECT_AFTER);
        assert_eq!(perf.evaluation_window, DEFAULT_EVALUATION_WINDOW);
        assert!(perf.auto_adjust_default);
    }

    #[test]
    fn test_malformed_value_is_error() {
        let file = write_config("[sampler]\ncapacity = lots\n");
        let err = ConfigFile::load_from(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                section: "sampler",
                key: "capacity",
                ..
            }
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let file = write_config("[controller]\nevaluation_interval_secs = 0\n");
        assert!(ConfigFile::load_from(file.path()).is_err());
    }

    #[test]
    fn test_huge_redetect_hours_rejected() {
        let file = write_config(&format!(
            "[controller]\nredetect_after_hours = {}\n",
            u64::MAX
        ));
        let err = ConfigFile::load_from(file.path()).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                key: "redetect_after_hours",
                ..
            }
        ));
    }

    #[test]
    fn test_window_larger_than_capacity_rejected() {
        let file = write_config("[sampler]\ncapacity = 5\nevaluation_window = 10\n");
        assert!(ConfigFile::load_from(file.path()).is_err());
    }

    #[test]
    fn test_logging_section() {
        let file = write_config("[logging]\ndirectory = /var/log/oceanperf\nlevel = debug\n");
        let config = ConfigFile::load_from(file.path()).unwrap();
        assert_eq!(config.logging.directory, PathBuf::from("/var/log/oceanperf"));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("sub").join("config.ini");

        let mut config = ConfigFile::default();
        config.performance.auto_adjust_default = false;
        config.performance.hysteresis_window = Duration::from_secs(30);
        config.logging.directory = temp.path().join("logs");
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/tmp/x"), PathBuf::from("/tmp/x"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_tilde("~/logs"), home.join("logs"));
        }
    }
}
