//! Simulate command - drive a controller with a synthetic frame rate trace.
//!
//! Runs on virtual time: every simulated second records a burst of frame
//! readings and every evaluation interval runs one tick, so a ten minute
//! trace finishes instantly.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use console::style;
use oceanperf::config::PerformanceSettings;
use oceanperf::controller::{AdaptivePerformanceController, TierDecision};
use oceanperf::quality::Tier;
use oceanperf::store::{MemoryPreferenceStore, StateStore};
use rand::Rng;

use crate::error::CliError;

/// Frame readings recorded per simulated second.
const READINGS_PER_SECOND: u32 = 10;

/// Frame rate during the crash window of [`Pattern::Crash`].
const CRASH_FPS: f32 = 4.0;

/// Shape of the synthetic frame rate trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Pattern {
    /// Constant frame rate at the base value
    Steady,
    /// Linear slide from the base value down to 20% of it
    Degrading,
    /// Linear climb from 40% of the base value up to 180% of it
    Recovering,
    /// Base value with a collapse between 30% and 50% of the run
    Crash,
}

impl Pattern {
    /// Frame rate at second `t` of a `total` second run.
    pub fn fps_at(self, t: u64, total: u64, base_fps: f32) -> f32 {
        let progress = if total == 0 {
            0.0
        } else {
            t as f32 / total as f32
        };
        match self {
            Pattern::Steady => base_fps,
            Pattern::Degrading => base_fps * (1.0 - 0.8 * progress),
            Pattern::Recovering => base_fps * (0.4 + 1.4 * progress),
            Pattern::Crash if (0.3..0.5).contains(&progress) => CRASH_FPS,
            Pattern::Crash => base_fps,
        }
    }
}

/// Arguments for the simulate command.
pub struct SimulateArgs {
    pub pattern: Pattern,
    pub seconds: u64,
    pub start: Tier,
    pub base_fps: f32,
    /// Relative noise applied to every reading (0.08 = ±8%).
    pub jitter: f32,
}

/// One tier change observed during a simulation.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedChange {
    pub at_secs: u64,
    pub decision: TierDecision,
    pub avg_fps: f32,
}

/// Outcome of a simulation run.
#[derive(Debug)]
pub struct SimulationOutcome {
    pub changes: Vec<SimulatedChange>,
    pub final_tier: Option<Tier>,
}

/// Run the simulate command.
pub fn run(settings: &PerformanceSettings, args: SimulateArgs) -> Result<(), CliError> {
    if args.seconds == 0 {
        return Err(CliError::Config("--seconds must be at least 1".to_string()));
    }
    if args.base_fps.is_nan() || args.base_fps <= 0.0 {
        return Err(CliError::Config("--base-fps must be positive".to_string()));
    }

    println!(
        "Simulating {:?} pattern for {}s from {} (base {:.0} fps, tick every {}s)",
        args.pattern,
        args.seconds,
        args.start,
        args.base_fps,
        tick_secs(settings)
    );
    println!();

    let outcome = simulate(settings, &args)?;

    for change in &outcome.changes {
        let arrow = if change.decision.to > change.decision.from {
            style("↑").green()
        } else {
            style("↓").red()
        };
        println!(
            "[{:>5}s] {} {} -> {}  {}  (avg {:.1} fps)",
            change.at_secs,
            arrow,
            change.decision.from,
            change.decision.to,
            change.decision.reason,
            change.avg_fps
        );
    }
    if outcome.changes.is_empty() {
        println!("No tier changes.");
    }

    println!();
    println!(
        "Final tier: {} after {} change(s)",
        outcome
            .final_tier
            .map_or_else(|| "emergency".to_string(), |t| t.to_string()),
        outcome.changes.len()
    );
    Ok(())
}

fn tick_secs(settings: &PerformanceSettings) -> u64 {
    settings.evaluation_interval.as_secs().max(1)
}

/// Drive a fresh in-memory controller through the trace.
pub fn simulate(
    settings: &PerformanceSettings,
    args: &SimulateArgs,
) -> Result<SimulationOutcome, CliError> {
    let store = Arc::new(MemoryPreferenceStore::new());
    let state = StateStore::new(store.clone());
    state.set_current_tier(args.start)?;
    state.set_last_detection_ms(chrono::Utc::now().timestamp_millis())?;

    let controller = AdaptivePerformanceController::builder()
        .with_settings(PerformanceSettings {
            auto_adjust_default: true,
            ..settings.clone()
        })
        .with_store(store)
        .without_runtime()
        .build();

    let mut rng = rand::rng();
    let jitter = args.jitter.clamp(0.0, 0.9);
    let tick = tick_secs(settings);
    let origin = Instant::now();
    let mut changes = Vec::new();

    for t in 0..args.seconds {
        let fps = args.pattern.fps_at(t, args.seconds, args.base_fps);
        for _ in 0..READINGS_PER_SECOND {
            let noise = if jitter > 0.0 {
                rng.random_range(-jitter..jitter)
            } else {
                0.0
            };
            controller.record_frame_performance(fps * (1.0 + noise));
        }

        let elapsed = t + 1;
        if elapsed % tick == 0 {
            let avg_fps = controller
                .sampler()
                .average_of_last(settings.evaluation_window);
            if let Some(decision) = controller.evaluate_at(origin + Duration::from_secs(elapsed)) {
                changes.push(SimulatedChange {
                    at_secs: elapsed,
                    decision,
                    avg_fps,
                });
            }
        }
    }

    Ok(SimulationOutcome {
        changes,
        final_tier: controller.current_tier(),
    })
}
