//! One-shot device capability probe.

use std::sync::Arc;

use tracing::{debug, warn};

use super::host::{HostInfoSource, ProbeError};
use super::specs::{quantize_memory_gb, CpuFamily, DeviceSpecs};

/// Memory assumed when the memory sub-probe fails (GB).
pub const DEFAULT_MEMORY_GB: u32 = 2;

/// Core count assumed when the core sub-probe fails.
pub const DEFAULT_CORES: usize = 4;

/// API level assumed when the OS sub-probe fails.
pub const DEFAULT_API_LEVEL: u32 = 26;

/// Resolution assumed when the display sub-probe fails.
pub const DEFAULT_RESOLUTION: (u32, u32) = (1920, 1080);

/// CPU family assumed when the ISA sub-probe fails.
pub const DEFAULT_CPU_FAMILY: CpuFamily = CpuFamily::Other;

/// Inspects host hardware and classifies it into a tier.
///
/// `detect` never fails: each sub-probe that errors is replaced with its
/// conservative default and the rest of the probe carries on.
#[derive(Clone)]
pub struct DeviceCapabilityProbe {
    host: Arc<dyn HostInfoSource>,
}

impl std::fmt::Debug for DeviceCapabilityProbe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceCapabilityProbe").finish_non_exhaustive()
    }
}

impl DeviceCapabilityProbe {
    /// Create a probe reading from the given host source.
    pub fn new(host: Arc<dyn HostInfoSource>) -> Self {
        Self { host }
    }

    /// Probe the host and compute specs, score and tier.
    pub fn detect(&self) -> DeviceSpecs {
        let memory_gb = or_default(
            "memory",
            self.host.total_memory_bytes().map(quantize_memory_gb),
            DEFAULT_MEMORY_GB,
        );
        let cores = or_default(
            "cores",
            self.host.logical_cores().and_then(|c| {
                if c == 0 {
                    Err(ProbeError::Malformed {
                        field: "cores",
                        value: "0".to_string(),
                    })
                } else {
                    Ok(c)
                }
            }),
            DEFAULT_CORES,
        );
        let api_level = or_default("api level", self.host.os_api_level(), DEFAULT_API_LEVEL);
        let (width, height) = or_default(
            "resolution",
            self.host.display_resolution(),
            DEFAULT_RESOLUTION,
        );
        let family = or_default("cpu family", self.host.cpu_family(), DEFAULT_CPU_FAMILY);

        let specs = DeviceSpecs::from_parts(
            memory_gb,
            cores,
            api_level,
            u64::from(width) * u64::from(height),
            family,
        );

        debug!(
            memory_gb = specs.memory_gb,
            cores = specs.cpu_cores,
            api_level = specs.os_api_level,
            pixels = specs.screen_pixels,
            cpu = %specs.cpu_family,
            score = specs.score,
            tier = %specs.tier,
            "Device capability probe complete"
        );

        specs
    }
}

fn or_default<T: std::fmt::Debug>(field: &'static str, result: Result<T, ProbeError>, default: T) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(field, error = %e, fallback = ?default, "Device sub-probe failed, using default");
            default
        }
    }
}
