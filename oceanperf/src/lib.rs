//! oceanperf - adaptive rendering quality for animated ocean backgrounds
//!
//! The library detects a device's capability tier, samples the live frame
//! rate and steps a quality tier up or down so the background stays smooth.
//!
//! - [`device`] - hardware probe and capability score
//! - [`quality`] - tier ladder and the profiles each tier renders with
//! - [`sampler`] - bounded frame rate buffer and issue detection
//! - [`store`] - persisted controller state
//! - [`controller`] - startup selection, monitoring loop, tier decisions
//! - [`config`] - `~/.oceanperf/config.ini`
//! - [`logging`] - tracing subscriber setup

pub mod config;
pub mod controller;
pub mod device;
pub mod logging;
pub mod quality;
pub mod sampler;
pub mod store;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
