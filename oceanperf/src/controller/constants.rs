//! Constants for the adaptive performance controller.
//!
//! These control:
//! - How often the monitoring loop evaluates the frame rate
//! - Crisis thresholds that bypass steady-state evaluation
//! - Steady-state thresholds and the hysteresis applied after a change

use std::time::Duration;

/// Interval between monitoring ticks.
pub const DEFAULT_EVALUATION_INTERVAL: Duration = Duration::from_secs(3);

/// Number of most recent samples averaged per tick.
pub const DEFAULT_EVALUATION_WINDOW: usize = 10;

/// Age after which the stored capability detection is repeated.
pub const DEFAULT_REDETECT_AFTER: Duration = Duration::from_secs(24 * 60 * 60);

/// Critical crisis: average below this fraction of target...
pub const CRITICAL_CRISIS_RATIO: f32 = 0.20;

/// ...or below this absolute floor, whichever is higher.
pub const CRITICAL_CRISIS_FLOOR_FPS: f32 = 15.0;

/// Severe crisis: average below this fraction of target...
pub const SEVERE_CRISIS_RATIO: f32 = 0.35;

/// ...or below this absolute floor, whichever is higher.
pub const SEVERE_CRISIS_FLOOR_FPS: f32 = 20.0;

/// Consecutive severe readings required before acting.
pub const SEVERE_READINGS_REQUIRED: u32 = 2;

/// Minimum time between two crisis downgrades.
pub const DEFAULT_CRISIS_COOLDOWN: Duration = Duration::from_secs(10);

/// Averaged readings kept for steady-state decisions.
pub const EVALUATION_HISTORY_SIZE: usize = 4;

/// Readings below the downgrade threshold needed to step down.
pub const DOWNGRADE_VOTES_REQUIRED: usize = 3;

/// Steady-state downgrade threshold as a fraction of target.
pub const DOWNGRADE_RATIO: f32 = 0.65;

/// Steady-state upgrade threshold as a fraction of target.
pub const UPGRADE_RATIO: f32 = 1.65;

/// Downgrade threshold shortly after an upgrade.
pub const HYSTERESIS_DOWNGRADE_RATIO: f32 = 0.75;

/// Upgrade threshold shortly after a downgrade.
pub const HYSTERESIS_UPGRADE_RATIO: f32 = 1.25;

/// How long after a tier change the hysteresis thresholds apply.
pub const DEFAULT_HYSTERESIS_WINDOW: Duration = Duration::from_secs(15);

/// Benchmark warm-up before the first reading.
pub const BENCHMARK_WARMUP: Duration = Duration::from_secs(2);

/// Benchmark polling interval; also the cancellation latency bound.
pub const BENCHMARK_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Benchmark verdict boundary between marginal and degraded.
pub const BENCHMARK_MARGINAL_RATIO: f32 = 0.65;
