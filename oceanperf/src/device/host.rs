//! Raw host descriptor sources.
//!
//! The probe never touches the operating system directly. It asks a
//! [`HostInfoSource`] for each descriptor so that failures stay per-field
//! and tests can inject exact hardware.

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::specs::CpuFamily;

/// Errors from a single host sub-probe.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Reading a system file failed.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The value was present but could not be interpreted.
    #[error("unexpected {field} value: {value}")]
    Malformed { field: &'static str, value: String },

    /// The descriptor is not available on this host.
    #[error("{0} is not available on this host")]
    Unavailable(&'static str),
}

/// Source of raw hardware descriptors.
///
/// Each method is an independent sub-probe. Returning an error for one
/// descriptor must not affect the others.
pub trait HostInfoSource: Send + Sync {
    /// Total physical memory in bytes.
    fn total_memory_bytes(&self) -> Result<u64, ProbeError>;

    /// Number of logical CPU cores.
    fn logical_cores(&self) -> Result<usize, ProbeError>;

    /// Platform API level (Android SDK level).
    fn os_api_level(&self) -> Result<u32, ProbeError>;

    /// Display resolution in physical pixels.
    fn display_resolution(&self) -> Result<(u32, u32), ProbeError>;

    /// CPU instruction-set family.
    fn cpu_family(&self) -> Result<CpuFamily, ProbeError>;
}

/// Location of the Android build properties file.
pub const BUILD_PROP_PATH: &str = "/system/build.prop";

/// Location of the Linux memory information file.
pub const MEMINFO_PATH: &str = "/proc/meminfo";

/// Reads descriptors from the running system.
///
/// The display resolution is not discoverable without a window; the render
/// layer passes it in via [`SystemHostInfo::with_display`].
#[derive(Debug, Clone, Default)]
pub struct SystemHostInfo {
    display: Option<(u32, u32)>,
    meminfo_path: Option<PathBuf>,
    build_prop_path: Option<PathBuf>,
}

impl SystemHostInfo {
    /// Create a source reading the default system locations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the display resolution reported by the render layer.
    pub fn with_display(mut self, width: u32, height: u32) -> Self {
        self.display = Some((width, height));
        self
    }

    /// Override the meminfo location (useful for testing).
    pub fn with_meminfo_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.meminfo_path = Some(path.into());
        self
    }

    /// Override the build.prop location (useful for testing).
    pub fn with_build_prop_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_prop_path = Some(path.into());
        self
    }

    fn meminfo_path(&self) -> &Path {
        self.meminfo_path
            .as_deref()
            .unwrap_or_else(|| Path::new(MEMINFO_PATH))
    }

    fn build_prop_path(&self) -> &Path {
        self.build_prop_path
            .as_deref()
            .unwrap_or_else(|| Path::new(BUILD_PROP_PATH))
    }
}

fn read_file(path: &Path) -> Result<String, ProbeError> {
    std::fs::read_to_string(path).map_err(|source| ProbeError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Parse `MemTotal:       16384000 kB` out of meminfo contents.
pub(crate) fn parse_meminfo_total(content: &str) -> Result<u64, ProbeError> {
    let line = content
        .lines()
        .find(|line| line.starts_with("MemTotal:"))
        .ok_or(ProbeError::Unavailable("MemTotal"))?;

    let parts: Vec<&str> = line.split_whitespace().collect();
    parts
        .get(1)
        .and_then(|kb| kb.parse::<u64>().ok())
        .and_then(|kb| kb.checked_mul(1024))
        .ok_or_else(|| ProbeError::Malformed {
            field: "MemTotal",
            value: line.to_string(),
        })
}

/// Parse `ro.build.version.sdk=33` out of build.prop contents.
pub(crate) fn parse_sdk_level(content: &str) -> Result<u32, ProbeError> {
    let value = content
        .lines()
        .filter_map(|line| line.trim().strip_prefix("ro.build.version.sdk="))
        .next()
        .ok_or(ProbeError::Unavailable("ro.build.version.sdk"))?;

    value.trim().parse().map_err(|_| ProbeError::Malformed {
        field: "ro.build.version.sdk",
        value: value.to_string(),
    })
}

impl HostInfoSource for SystemHostInfo {
    fn total_memory_bytes(&self) -> Result<u64, ProbeError> {
        parse_meminfo_total(&read_file(self.meminfo_path())?)
    }

    fn logical_cores(&self) -> Result<usize, ProbeError> {
        std::thread::available_parallelism()
            .map(|p| p.get())
            .map_err(|_| ProbeError::Unavailable("available_parallelism"))
    }

    fn os_api_level(&self) -> Result<u32, ProbeError> {
        parse_sdk_level(&read_file(self.build_prop_path())?)
    }

    fn display_resolution(&self) -> Result<(u32, u32), ProbeError> {
        self.display.ok_or(ProbeError::Unavailable("display resolution"))
    }

    fn cpu_family(&self) -> Result<CpuFamily, ProbeError> {
        Ok(CpuFamily::from_arch(std::env::consts::ARCH))
    }
}

/// Host source with fixed, injected values.
///
/// Any field left as `None` behaves like a failing sub-probe.
#[derive(Debug, Clone, Default)]
pub struct FixedHostInfo {
    pub memory_bytes: Option<u64>,
    pub cores: Option<usize>,
    pub api_level: Option<u32>,
    pub resolution: Option<(u32, u32)>,
    pub family: Option<CpuFamily>,
}

impl FixedHostInfo {
    /// Create a source where every descriptor is known.
    pub fn new(
        memory_gb: u64,
        cores: usize,
        api_level: u32,
        resolution: (u32, u32),
        family: CpuFamily,
    ) -> Self {
        Self {
            memory_bytes: Some(memory_gb * 1024 * 1024 * 1024),
            cores: Some(cores),
            api_level: Some(api_level),
            resolution: Some(resolution),
            family: Some(family),
        }
    }
}

impl HostInfoSource for FixedHostInfo {
    fn total_memory_bytes(&self) -> Result<u64, ProbeError> {
        self.memory_bytes.ok_or(ProbeError::Unavailable("memory"))
    }

    fn logical_cores(&self) -> Result<usize, ProbeError> {
        self.cores.ok_or(ProbeError::Unavailable("cores"))
    }

    fn os_api_level(&self) -> Result<u32, ProbeError> {
        self.api_level.ok_or(ProbeError::Unavailable("api level"))
    }

    fn display_resolution(&self) -> Result<(u32, u32), ProbeError> {
        self.resolution
            .ok_or(ProbeError::Unavailable("display resolution"))
    }

    fn cpu_family(&self) -> Result<CpuFamily, ProbeError> {
        self.family.ok_or(ProbeError::Unavailable("cpu family"))
    }
}
