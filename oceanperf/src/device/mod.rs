//! Device capability detection.
//!
//! Reads raw hardware descriptors through a [`HostInfoSource`], derives a
//! 0-100 performance score and maps it to a starting [`Tier`](crate::quality::Tier).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use oceanperf::device::{CpuFamily, DeviceCapabilityProbe, FixedHostInfo};
//! use oceanperf::quality::Tier;
//!
//! let host = FixedHostInfo::new(4, 6, 28, (1920, 1080), CpuFamily::X86_64);
//! let specs = DeviceCapabilityProbe::new(Arc::new(host)).detect();
//! assert_eq!(specs.score, 40);
//! assert_eq!(specs.tier, Tier::Low);
//! ```

mod host;
mod probe;
mod specs;

pub use host::{
    FixedHostInfo, HostInfoSource, ProbeError, SystemHostInfo, BUILD_PROP_PATH, MEMINFO_PATH,
};
pub use probe::{
    DeviceCapabilityProbe, DEFAULT_API_LEVEL, DEFAULT_CORES, DEFAULT_CPU_FAMILY,
    DEFAULT_MEMORY_GB, DEFAULT_RESOLUTION,
};
pub use specs::{
    performance_score, quantize_memory_gb, tier_for_score, CpuFamily, DeviceSpecs, LOW_THRESHOLD,
    MEDIUM_THRESHOLD, VERY_LOW_THRESHOLD,
};
