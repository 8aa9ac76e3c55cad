//! Detect command - probe the host and print the capability score.

use std::sync::Arc;

use oceanperf::device::{DeviceCapabilityProbe, SystemHostInfo};
use oceanperf::quality::QualityProfileCatalog;

use crate::error::CliError;

/// Arguments for the detect command.
pub struct DetectArgs {
    /// Display size to score with, since a terminal has none.
    pub display: Option<(u32, u32)>,
    pub json: bool,
}

/// Run the detect command.
pub fn run(args: DetectArgs) -> Result<(), CliError> {
    let mut host = SystemHostInfo::new();
    if let Some((width, height)) = args.display {
        host = host.with_display(width, height);
    }

    let specs = DeviceCapabilityProbe::new(Arc::new(host)).detect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&specs)?);
        return Ok(());
    }

    let profile = QualityProfileCatalog::profile_for(specs.tier);
    println!("{}", specs.debug_summary());
    println!();
    println!("Starting profile: {}", profile);
    println!("  {}", specs.tier.description());

    Ok(())
}

/// Parse a `WIDTHxHEIGHT` display size.
pub fn parse_display(value: &str) -> Result<(u32, u32), String> {
    let (width, height) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", value))?;
    let width: u32 = width
        .trim()
        .parse()
        .map_err(|_| format!("invalid width '{}'", width))?;
    let height: u32 = height
        .trim()
        .parse()
        .map_err(|_| format!("invalid height '{}'", height))?;
    if width == 0 || height == 0 {
        return Err("display dimensions must be non-zero".to_string());
    }
    Ok((width, height))
}
