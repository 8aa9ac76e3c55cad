//! Device specifications and performance scoring.
//!
//! # Score
//!
//! ```text
//! memory (≤25) + cores (≤25) + OS level (≤30)
//!     − resolution penalty (0 / 5 / 10)
//!     + architecture bonus (5 for 64-bit ARM)
//! clamped to 0..=100
//! ```

use std::fmt;

use serde::Serialize;

use crate::quality::Tier;

/// Score below which a device is `VeryLow`.
pub const VERY_LOW_THRESHOLD: u8 = 35;

/// Score below which a device is `Low`.
pub const LOW_THRESHOLD: u8 = 55;

/// Score below which a device is `Medium`; at or above is `High`.
pub const MEDIUM_THRESHOLD: u8 = 80;

/// Pixel count of a 1920×1080 display.
pub const PIXELS_1080P: u64 = 1920 * 1080;

/// Pixel count of a 2560×1440 display.
pub const PIXELS_1440P: u64 = 2560 * 1440;

/// Common memory sizes devices are marketed with, in GB.
const MEMORY_STEPS_GB: [u32; 12] = [1, 2, 3, 4, 6, 8, 12, 16, 24, 32, 48, 64];

/// CPU instruction-set family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CpuFamily {
    Arm64,
    Arm32,
    X86_64,
    X86,
    Other,
}

impl CpuFamily {
    /// Map a Rust target architecture name (`std::env::consts::ARCH`).
    pub fn from_arch(arch: &str) -> Self {
        match arch {
            "aarch64" | "arm64" | "arm64-v8a" => CpuFamily::Arm64,
            "arm" | "armeabi-v7a" => CpuFamily::Arm32,
            "x86_64" => CpuFamily::X86_64,
            "x86" => CpuFamily::X86,
            _ => CpuFamily::Other,
        }
    }
}

impl fmt::Display for CpuFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CpuFamily::Arm64 => "arm64",
            CpuFamily::Arm32 => "arm32",
            CpuFamily::X86_64 => "x86_64",
            CpuFamily::X86 => "x86",
            CpuFamily::Other => "other",
        };
        write!(f, "{}", name)
    }
}

/// Hardware description captured by one probe run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeviceSpecs {
    /// Total memory, quantized to a marketed size.
    pub memory_gb: u32,

    /// Logical core count.
    pub cpu_cores: usize,

    /// Platform API level.
    pub os_api_level: u32,

    /// Display width × height in pixels.
    pub screen_pixels: u64,

    /// Instruction-set family.
    pub cpu_family: CpuFamily,

    /// Derived 0-100 score.
    pub score: u8,

    /// Derived tier.
    pub tier: Tier,
}

impl DeviceSpecs {
    /// Build specs from raw descriptors, computing score and tier.
    pub fn from_parts(
        memory_gb: u32,
        cpu_cores: usize,
        os_api_level: u32,
        screen_pixels: u64,
        cpu_family: CpuFamily,
    ) -> Self {
        let score = performance_score(memory_gb, cpu_cores, os_api_level, screen_pixels, cpu_family);
        Self {
            memory_gb,
            cpu_cores,
            os_api_level,
            screen_pixels,
            cpu_family,
            score,
            tier: tier_for_score(score),
        }
    }

    /// Multi-line dump for developer logs. Not a stable format.
    pub fn debug_summary(&self) -> String {
        format!(
            "Device specs:\n  memory: {} GB ({} pts)\n  cores: {} ({} pts)\n  \
             api level: {} ({} pts)\n  pixels: {} (-{} pts)\n  cpu: {} (+{} pts)\n  \
             score: {}\n  tier: {}",
            self.memory_gb,
            memory_score(self.memory_gb),
            self.cpu_cores,
            core_score(self.cpu_cores),
            self.os_api_level,
            os_score(self.os_api_level),
            self.screen_pixels,
            resolution_penalty(self.screen_pixels),
            self.cpu_family,
            architecture_bonus(self.cpu_family),
            self.score,
            self.tier
        )
    }
}

/// Quantize a raw byte count to the nearest marketed memory size at or above it.
///
/// Devices report slightly less than their nominal memory (e.g. 7.6 GB for
/// an 8 GB phone), so values round up to the next step.
pub fn quantize_memory_gb(bytes: u64) -> u32 {
    let gb = bytes as f64 / (1024.0 * 1024.0 * 1024.0);
    MEMORY_STEPS_GB
        .iter()
        .copied()
        .find(|step| gb <= *step as f64)
        .unwrap_or_else(|| gb.round() as u32)
}

/// Memory sub-score (max 25).
pub fn memory_score(memory_gb: u32) -> i32 {
    match memory_gb {
        m if m >= 8 => 25,
        m if m >= 6 => 20,
        m if m >= 4 => 15,
        m if m >= 3 => 10,
        _ => 5,
    }
}

/// Core-count sub-score (max 25).
pub fn core_score(cores: usize) -> i32 {
    match cores {
        c if c > 8 => 25,
        8 => 20,
        _ => 10,
    }
}

/// OS version sub-score (max 30).
pub fn os_score(api_level: u32) -> i32 {
    match api_level {
        l if l >= 33 => 30,
        l if l >= 29 => 22,
        l if l >= 26 => 15,
        _ => 8,
    }
}

/// Penalty for driving more pixels than 1080p / 1440p.
pub fn resolution_penalty(pixels: u64) -> i32 {
    if pixels > PIXELS_1440P {
        10
    } else if pixels > PIXELS_1080P {
        5
    } else {
        0
    }
}

/// Bonus for 64-bit ARM cores.
pub fn architecture_bonus(family: CpuFamily) -> i32 {
    if family == CpuFamily::Arm64 {
        5
    } else {
        0
    }
}

/// Combined score clamped to 0..=100.
pub fn performance_score(
    memory_gb: u32,
    cores: usize,
    api_level: u32,
    pixels: u64,
    family: CpuFamily,
) -> u8 {
    let score = memory_score(memory_gb) + core_score(cores) + os_score(api_level)
        - resolution_penalty(pixels)
        + architecture_bonus(family);
    score.clamp(0, 100) as u8
}

/// Map a score to a tier.
pub fn tier_for_score(score: u8) -> Tier {
    if score < VERY_LOW_THRESHOLD {
        Tier::VeryLow
    } else if score < LOW_THRESHOLD {
        Tier::Low
    } else if score < MEDIUM_THRESHOLD {
        Tier::Medium
    } else {
        Tier::High
    }
}
