//! Integration tests for the adaptive performance controller.
//!
//! These tests verify the complete controller flow including:
//! - Fresh install → detection → persisted tier
//! - Restart → restored tier without probing
//! - Crisis and steady-state tier changes through the public API
//! - Background monitoring on a (paused) tokio clock
//!
//! Run with: `cargo test --test controller_integration`

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use oceanperf::config::PerformanceSettings;
use oceanperf::controller::{
    AdaptivePerformanceController, BenchmarkError, DecisionReason, TierDecision,
};
use oceanperf::device::{CpuFamily, FixedHostInfo, HostInfoSource, ProbeError};
use oceanperf::quality::{QualityProfileCatalog, Tier};
use oceanperf::store::{
    keys, IniPreferenceStore, MemoryPreferenceStore, PreferenceStore, StoreResult,
};

// ============================================================================
// Helper Functions
// ============================================================================

/// Host source that counts how often the memory descriptor is read.
struct CountingHost {
    inner: FixedHostInfo,
    reads: AtomicUsize,
}

impl CountingHost {
    fn new(inner: FixedHostInfo) -> Arc<Self> {
        Arc::new(Self {
            inner,
            reads: AtomicUsize::new(0),
        })
    }

    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl HostInfoSource for CountingHost {
    fn total_memory_bytes(&self) -> Result<u64, ProbeError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.total_memory_bytes()
    }

    fn logical_cores(&self) -> Result<usize, ProbeError> {
        self.inner.logical_cores()
    }

    fn os_api_level(&self) -> Result<u32, ProbeError> {
        self.inner.os_api_level()
    }

    fn display_resolution(&self) -> Result<(u32, u32), ProbeError> {
        self.inner.display_resolution()
    }

    fn cpu_family(&self) -> Result<CpuFamily, ProbeError> {
        self.inner.cpu_family()
    }
}

/// Store that panics on the first tier write once armed.
struct PanickingStore {
    inner: MemoryPreferenceStore,
    armed: AtomicBool,
}

impl PanickingStore {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: MemoryPreferenceStore::new(),
            armed: AtomicBool::new(false),
        })
    }

    fn arm(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }
}

impl PreferenceStore for PanickingStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        if key == keys::CURRENT_TIER && self.armed.swap(false, Ordering::SeqCst) {
            panic!("disk went away");
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        self.inner.remove(key)
    }
}

/// Scores 40: 4 GB (15) + 6 cores (10) + API 28 (15) + 1080p (0) + x86_64 (0).
fn mid_range_phone() -> FixedHostInfo {
    FixedHostInfo::new(4, 6, 28, (1920, 1080), CpuFamily::X86_64)
}

/// Scores 80: 12 GB (25) + 10 cores (25) + API 34 (30) - 2400p (5) + arm64 (5).
fn flagship_phone() -> FixedHostInfo {
    FixedHostInfo::new(12, 10, 34, (1080, 2400), CpuFamily::Arm64)
}

fn offline_controller(
    store: Arc<dyn PreferenceStore>,
    host: Arc<dyn HostInfoSource>,
) -> AdaptivePerformanceController {
    AdaptivePerformanceController::builder()
        .with_store(store)
        .with_host(host)
        .without_runtime()
        .build()
}

/// Fill the evaluation window with one frame rate.
fn feed(controller: &AdaptivePerformanceController, fps: f32) {
    for _ in 0..10 {
        controller.record_frame_performance(fps);
    }
}

/// Run `ticks` evaluation ticks 3 s apart starting at `start`.
fn run_ticks(
    controller: &AdaptivePerformanceController,
    fps: f32,
    start: Instant,
    ticks: u64,
) -> Vec<TierDecision> {
    (0..ticks)
        .filter_map(|i| {
            feed(controller, fps);
            controller.evaluate_at(start + Duration::from_secs(3 * i))
        })
        .collect()
}

// ============================================================================
// Startup
// ============================================================================

/// Fresh install: no state → detection → score 40 → Low, persisted as "LOW".
#[test]
fn test_fresh_install_end_to_end() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("performance_state.ini");
    let store = Arc::new(IniPreferenceStore::open(&path).unwrap());
    let host = CountingHost::new(mid_range_phone());

    let controller = offline_controller(store.clone(), host.clone());

    assert_eq!(host.reads(), 1);
    assert_eq!(controller.current_tier(), Some(Tier::Low));
    assert!(Arc::ptr_eq(
        &controller.current_config(),
        &QualityProfileCatalog::low()
    ));
    assert_eq!(store.get(keys::CURRENT_TIER).unwrap().as_deref(), Some("LOW"));

    let status = controller.status();
    assert_eq!(status.device.as_ref().map(|d| d.score), Some(40));

    let on_disk = std::fs::read_to_string(&path).unwrap();
    assert!(on_disk.contains("current_tier=LOW"));
}

/// Restart within a day restores the same profile without probing again.
#[test]
fn test_restart_restores_without_detection() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("performance_state.ini");

    let first_profile = {
        let store = Arc::new(IniPreferenceStore::open(&path).unwrap());
        let host = CountingHost::new(flagship_phone());
        let controller = offline_controller(store, host.clone());
        assert_eq!(host.reads(), 1);

        feed(&controller, 58.0);
        controller.shutdown();
        controller.current_config()
    };
    assert_eq!(first_profile.tier, Some(Tier::High));

    let store = Arc::new(IniPreferenceStore::open(&path).unwrap());
    let host = CountingHost::new(mid_range_phone());
    let controller = offline_controller(store, host.clone());

    assert_eq!(host.reads(), 0);
    assert!(Arc::ptr_eq(&controller.current_config(), &first_profile));
    assert_eq!(controller.sampler().len(), 10);
    assert_eq!(controller.sampler().average(), 58.0);
}

/// A corrupt persisted tier selects the emergency profile until redetection.
#[test]
fn test_corrupt_state_falls_back_to_emergency() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("performance_state.ini");
    let now_ms = chrono::Utc::now().timestamp_millis();
    std::fs::write(
        &path,
        format!("[performance]\ncurrent_tier=WARP\nlast_detection_time={now_ms}\n"),
    )
    .unwrap();

    let store = Arc::new(IniPreferenceStore::open(&path).unwrap());
    let controller = offline_controller(store.clone(), Arc::new(mid_range_phone()));

    assert!(Arc::ptr_eq(
        &controller.current_config(),
        &QualityProfileCatalog::emergency()
    ));
    assert_eq!(controller.current_tier(), None);

    // Frame rate alone never leaves emergency
    assert!(run_ticks(&controller, 120.0, Instant::now(), 8).is_empty());

    controller.force_redetection();
    assert_eq!(controller.current_tier(), Some(Tier::Low));
    assert_eq!(store.get(keys::CURRENT_TIER).unwrap().as_deref(), Some("LOW"));
}

// ============================================================================
// Tier Changes
// ============================================================================

/// Critical crisis: one reading far below target drops exactly one tier.
#[test]
fn test_critical_crisis_drops_one_tier() {
    let store = Arc::new(MemoryPreferenceStore::new());
    let controller = offline_controller(store.clone(), Arc::new(flagship_phone()));
    assert_eq!(controller.current_tier(), Some(Tier::High));

    feed(&controller, 5.0);
    let decision = controller.evaluate_at(Instant::now()).unwrap();

    assert_eq!(decision.reason, DecisionReason::CriticalCrisis);
    assert_eq!(controller.current_tier(), Some(Tier::Medium));
    assert_eq!(
        store.get(keys::CURRENT_TIER).unwrap().as_deref(),
        Some("MEDIUM")
    );
}

/// Crisis downgrades are spaced by the cooldown.
#[test]
fn test_crisis_cooldown_spaces_downgrades() {
    let controller = offline_controller(
        Arc::new(MemoryPreferenceStore::new()),
        Arc::new(flagship_phone()),
    );
    let start = Instant::now();

    // Ticks at 0, 3, 6, 9, 12 s: crisis at 0 s, then not again until 12 s
    let decisions = run_ticks(&controller, 5.0, start, 5);
    let tiers: Vec<Tier> = decisions.iter().map(|d| d.to).collect();
    assert_eq!(tiers, vec![Tier::Medium, Tier::Low]);
    assert_eq!(controller.current_tier(), Some(Tier::Low));
}

/// Severe crisis needs two consecutive readings.
#[test]
fn test_severe_crisis_needs_consecutive_readings() {
    let controller = offline_controller(
        Arc::new(MemoryPreferenceStore::new()),
        Arc::new(mid_range_phone()),
    );
    let start = Instant::now();

    // Low targets 30 fps: severe below 20, critical below 15
    feed(&controller, 18.0);
    assert!(controller.evaluate_at(start).is_none());
    feed(&controller, 28.0);
    assert!(controller
        .evaluate_at(start + Duration::from_secs(3))
        .is_none());
    feed(&controller, 18.0);
    assert!(controller
        .evaluate_at(start + Duration::from_secs(6))
        .is_none());

    feed(&controller, 18.0);
    let decision = controller
        .evaluate_at(start + Duration::from_secs(9))
        .unwrap();
    assert_eq!(decision.reason, DecisionReason::SevereCrisis);
    assert_eq!(controller.current_tier(), Some(Tier::VeryLow));
}

/// Sustained moderate drop walks High → Medium via the steady-state path.
#[test]
fn test_sustained_low_frame_rate_downgrades() {
    let controller = offline_controller(
        Arc::new(MemoryPreferenceStore::new()),
        Arc::new(flagship_phone()),
    );

    // High targets 60: 30 fps is below 39 but above the crisis thresholds
    let decisions = run_ticks(&controller, 30.0, Instant::now(), 4);
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].reason, DecisionReason::SustainedLow);
    assert_eq!(controller.current_tier(), Some(Tier::Medium));
}

/// Sustained headroom walks Low → Medium.
#[test]
fn test_sustained_headroom_upgrades() {
    let controller = offline_controller(
        Arc::new(MemoryPreferenceStore::new()),
        Arc::new(mid_range_phone()),
    );

    let decisions = run_ticks(&controller, 60.0, Instant::now(), 4);
    assert_eq!(decisions.len(), 1);
    assert_eq!(decisions[0].reason, DecisionReason::SustainedHigh);
    assert_eq!(controller.current_tier(), Some(Tier::Medium));
}

/// Noisy but healthy frame rates never move the tier.
#[test]
fn test_noisy_healthy_frame_rate_is_stable() {
    let controller = offline_controller(
        Arc::new(MemoryPreferenceStore::new()),
        Arc::new(mid_range_phone()),
    );
    let mut rng = rand::rng();
    let start = Instant::now();

    for tick in 0..40u64 {
        for _ in 0..10 {
            controller.record_frame_performance(rng.random_range(26.0..44.0));
        }
        let decision = controller.evaluate_at(start + Duration::from_secs(3 * tick));
        assert!(decision.is_none(), "tick {tick}: {decision:?}");
    }
    assert_eq!(controller.current_tier(), Some(Tier::Low));
}

/// With an override set, samples are collected but the tier stays pinned.
#[test]
fn test_override_pins_tier() {
    let store = Arc::new(MemoryPreferenceStore::new());
    let controller = offline_controller(store.clone(), Arc::new(mid_range_phone()));
    controller.set_user_override(Tier::High);

    assert!(run_ticks(&controller, 5.0, Instant::now(), 6).is_empty());
    assert_eq!(controller.current_tier(), Some(Tier::High));
    assert!(!controller.sampler().is_empty());

    controller.clear_user_override();
    assert_eq!(controller.current_tier(), Some(Tier::Low));
    assert_eq!(store.get(keys::USER_OVERRIDE_TIER).unwrap(), None);
}

// ============================================================================
// Background Monitoring
// ============================================================================

/// The monitoring task evaluates on its interval and publishes changes.
#[tokio::test(start_paused = true)]
async fn test_monitor_applies_crisis_downgrade() {
    let controller = AdaptivePerformanceController::builder()
        .with_store(Arc::new(MemoryPreferenceStore::new()))
        .with_host(Arc::new(flagship_phone()))
        .build();
    assert!(controller.is_monitoring());

    let mut rx = controller.subscribe();
    feed(&controller, 5.0);

    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("tier change within one interval")
        .unwrap();
    assert_eq!(rx.borrow().tier, Some(Tier::Medium));

    controller.shutdown();
    assert!(!controller.is_monitoring());
}

/// Pause and resume toggle the task without touching the persisted flag.
/// A panicking tick is logged and the next tick still runs.
#[tokio::test(start_paused = true)]
async fn test_monitor_survives_panicking_tick() {
    let store = PanickingStore::new();
    let controller = AdaptivePerformanceController::builder()
        .with_settings(PerformanceSettings {
            crisis_cooldown: Duration::ZERO,
            ..PerformanceSettings::default()
        })
        .with_store(store.clone())
        .with_host(Arc::new(flagship_phone()))
        .build();
    assert_eq!(controller.current_tier(), Some(Tier::High));
    store.arm();

    let mut rx = controller.subscribe();
    feed(&controller, 5.0);

    // First crisis: applied in memory, the write panics.
    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("first tier change")
        .unwrap();
    assert_eq!(rx.borrow_and_update().tier, Some(Tier::Medium));
    assert_eq!(store.get(keys::CURRENT_TIER).unwrap().as_deref(), Some("HIGH"));

    // Second crisis on the following tick.
    tokio::time::timeout(Duration::from_secs(5), rx.changed())
        .await
        .expect("second tier change")
        .unwrap();
    assert_eq!(rx.borrow().tier, Some(Tier::Low));
    assert!(controller.is_monitoring());
    assert_eq!(controller.status().tier_changes, 2);
    assert_eq!(store.get(keys::CURRENT_TIER).unwrap().as_deref(), Some("LOW"));

    controller.shutdown();
}

#[tokio::test(start_paused = true)]
async fn test_pause_resume_lifecycle() {
    let store = Arc::new(MemoryPreferenceStore::new());
    let controller = AdaptivePerformanceController::builder()
        .with_store(store.clone())
        .with_host(Arc::new(flagship_phone()))
        .build();

    controller.pause_monitoring();
    assert!(!controller.is_monitoring());

    // Paused: a crisis goes unnoticed
    feed(&controller, 5.0);
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(controller.current_tier(), Some(Tier::High));

    controller.resume_monitoring();
    assert!(controller.is_monitoring());
    assert!(controller.is_auto_adjust_enabled());
    assert_eq!(store.get(keys::AUTO_ADJUST_ENABLED).unwrap(), None);

    controller.set_auto_adjust_enabled(false);
    assert!(!controller.is_monitoring());
    controller.resume_monitoring();
    assert!(!controller.is_monitoring());
}

/// Disabled auto-adjust is remembered across restarts.
#[tokio::test]
async fn test_auto_adjust_flag_survives_restart() {
    let store = Arc::new(MemoryPreferenceStore::new());
    {
        let controller = AdaptivePerformanceController::builder()
            .with_store(store.clone())
            .with_host(Arc::new(mid_range_phone()))
            .build();
        controller.set_auto_adjust_enabled(false);
    }

    let controller = AdaptivePerformanceController::builder()
        .with_store(store)
        .with_host(Arc::new(mid_range_phone()))
        .with_settings(PerformanceSettings::default())
        .build();
    assert!(!controller.is_auto_adjust_enabled());
    assert!(!controller.is_monitoring());
}

// ============================================================================
// Benchmark
// ============================================================================

/// Cancelling a benchmark returns promptly with `Cancelled`.
#[tokio::test]
async fn test_benchmark_cancel() {
    let controller = offline_controller(
        Arc::new(MemoryPreferenceStore::new()),
        Arc::new(mid_range_phone()),
    );
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let started = Instant::now();
    let result = controller
        .run_benchmark(Duration::from_secs(30), cancel)
        .await;
    assert_eq!(result, Err(BenchmarkError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(2));
}
