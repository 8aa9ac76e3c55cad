//! Benchmark command - measure a synthetic frame source for a fixed window.

use std::sync::Arc;
use std::time::Duration;

use console::style;
use oceanperf::config::PerformanceSettings;
use oceanperf::controller::{AdaptivePerformanceController, BenchmarkReport, BenchmarkVerdict};
use oceanperf::quality::Tier;
use oceanperf::store::{MemoryPreferenceStore, StateStore};
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::CliError;

/// Interval between synthetic frame readings.
const FEED_INTERVAL: Duration = Duration::from_millis(100);

/// Arguments for the benchmark command.
pub struct BenchmarkArgs {
    pub seconds: u64,
    pub fps: f32,
    /// Tier whose target the result is judged against; detected when unset.
    pub tier: Option<Tier>,
    pub jitter: f32,
    pub json: bool,
}

/// Run the benchmark command.
pub fn run(settings: &PerformanceSettings, args: BenchmarkArgs) -> Result<(), CliError> {
    if args.fps.is_nan() || args.fps <= 0.0 {
        return Err(CliError::Config("--fps must be positive".to_string()));
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;

    let cancel = CancellationToken::new();
    let handler_token = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!();
        eprintln!("Received interrupt, cancelling benchmark...");
        handler_token.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let report = runtime.block_on(run_async(settings, &args, cancel))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

async fn run_async(
    settings: &PerformanceSettings,
    args: &BenchmarkArgs,
    cancel: CancellationToken,
) -> Result<BenchmarkReport, CliError> {
    let store = Arc::new(MemoryPreferenceStore::new());
    if let Some(tier) = args.tier {
        let state = StateStore::new(store.clone());
        state.set_current_tier(tier)?;
        state.set_last_detection_ms(chrono::Utc::now().timestamp_millis())?;
    }

    let controller = Arc::new(
        AdaptivePerformanceController::builder()
            .with_settings(settings.clone())
            .with_store(store)
            .without_runtime()
            .build(),
    );
    let profile = controller.current_config();

    println!(
        "Benchmarking {}s of synthetic {:.0} fps against {} (target {} fps)",
        args.seconds, args.fps, profile.name, profile.target_fps
    );
    println!("Press Ctrl+C to cancel");

    let feeder_token = cancel.child_token();
    let feeder = tokio::spawn(feed(
        Arc::clone(&controller),
        args.fps,
        args.jitter.clamp(0.0, 0.9),
        feeder_token.clone(),
    ));

    let result = controller
        .run_benchmark(Duration::from_secs(args.seconds), cancel)
        .await;

    feeder_token.cancel();
    let _ = feeder.await;

    let report = result?;
    info!(
        average_fps = report.average_fps,
        verdict = %report.verdict,
        "Benchmark finished"
    );
    Ok(report)
}

/// Record noisy readings around `fps` until cancelled.
async fn feed(
    controller: Arc<AdaptivePerformanceController>,
    fps: f32,
    jitter: f32,
    token: CancellationToken,
) {
    let mut interval = tokio::time::interval(FEED_INTERVAL);
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = interval.tick() => {
                let noise = if jitter > 0.0 {
                    rand::rng().random_range(-jitter..jitter)
                } else {
                    0.0
                };
                controller.record_frame_performance(fps * (1.0 + noise));
            }
        }
    }
}

fn print_report(report: &BenchmarkReport) {
    let verdict = match report.verdict {
        BenchmarkVerdict::Sustained => style(report.verdict.to_string()).green(),
        BenchmarkVerdict::Marginal => style(report.verdict.to_string()).yellow(),
        BenchmarkVerdict::Degraded => style(report.verdict.to_string()).red(),
    };

    println!();
    println!("Benchmark Summary");
    println!("─────────────────");
    println!("  Duration:  {:.1}s", report.duration_secs);
    println!("  Readings:  {}", report.readings.len());
    println!(
        "  Frame rate: {:.1} avg, {:.1} min, {:.1} max (target {})",
        report.average_fps, report.min_fps, report.max_fps, report.target_fps
    );
    println!("  Samples:   {}", report.sample_count);
    println!("  Issues:    {}", report.issues.severity);
    println!("  Verdict:   {}", verdict);
}
