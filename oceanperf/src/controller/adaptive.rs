//! Adaptive performance controller.
//!
//! Owns the active quality tier. On construction it either probes the device
//! or restores the persisted tier; afterwards a background task evaluates the
//! recorded frame rate every few seconds and steps the tier up or down.
//!
//! ```text
//!  render loop                       controller                      render loop
//!  ───────────                       ──────────                      ───────────
//!  record_frame_performance ──► FrameRateSampler
//!                                     │ every 3s
//!                                     ▼
//!                               TierEvaluator ──► Tier ──► watch<Arc<QualityProfile>> ──► current_config()
//!                                     │
//!                                     ▼
//!                               PreferenceStore (current_tier, history, ...)
//! ```
//!
//! Tier changes are serialized by one mutex. The published profile is an
//! `Arc` swapped inside a watch channel, so readers never block on the
//! controller and never see a partially updated profile.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::benchmark::{BenchmarkReport, PerformanceBenchmark};
use super::builder::AdaptivePerformanceControllerBuilder;
use super::error::{BenchmarkError, ControllerError};
use super::evaluator::{TierDecision, TierEvaluator};
use super::monitor::MonitorHandle;
use super::status::PerformanceStatus;
use crate::config::PerformanceSettings;
use crate::device::{DeviceCapabilityProbe, DeviceSpecs};
use crate::quality::{QualityProfile, QualityProfileCatalog, Tier};
use crate::sampler::FrameRateSampler;
use crate::store::{StateStore, StoreResult};

/// Whether the stored detection is missing or older than `redetect_after`.
pub fn should_detect(last_detection_ms: i64, now_ms: i64, redetect_after: Duration) -> bool {
    if last_detection_ms == 0 {
        return true;
    }
    let age_ms = now_ms.saturating_sub(last_detection_ms);
    age_ms >= redetect_after.as_millis() as i64
}

fn wall_clock_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Mutable controller state, guarded by one lock.
#[derive(Debug)]
struct ControlState {
    /// Last tier on the ladder, kept while an override or emergency is active.
    tier: Tier,
    emergency: bool,
    user_override: Option<Tier>,
    auto_adjust: bool,
    evaluator: TierEvaluator,
    device: Option<DeviceSpecs>,
    total_runtime: Duration,
    last_tick: Option<Instant>,
    tier_changes: u64,
    last_decision: Option<TierDecision>,
}

impl ControlState {
    fn active_profile(&self) -> Arc<QualityProfile> {
        if self.emergency {
            QualityProfileCatalog::emergency()
        } else {
            QualityProfileCatalog::profile_for(self.user_override.unwrap_or(self.tier))
        }
    }
}

/// State shared between the controller and its monitoring task.
pub(crate) struct ControllerShared {
    settings: PerformanceSettings,
    state: StateStore,
    probe: DeviceCapabilityProbe,
    sampler: FrameRateSampler,
    control: Mutex<ControlState>,
    profile_tx: watch::Sender<Arc<QualityProfile>>,
}

impl ControllerShared {
    pub(crate) fn settings(&self) -> &PerformanceSettings {
        &self.settings
    }

    fn log_store_error(&self, what: &'static str, result: StoreResult<()>) {
        if let Err(e) = result {
            warn!(what, error = %e, "Failed to persist performance state");
        }
    }

    fn publish(&self, control: &ControlState) {
        let profile = control.active_profile();
        debug!(profile = profile.name, "Publishing quality profile");
        self.profile_tx.send_replace(profile);
    }

    /// Probe the device, adopt its tier and stamp the detection time.
    fn detect(&self, control: &mut ControlState) {
        let specs = self.probe.detect();
        info!(
            score = specs.score,
            tier = %specs.tier,
            memory_gb = specs.memory_gb,
            cores = specs.cpu_cores,
            "Device capability detected"
        );

        control.tier = specs.tier;
        control.device = Some(specs);
        control.emergency = false;
        control.evaluator.reset();

        if let Err(e) = self.state.user_override() {
            warn!(error = %e, "Dropping unreadable user override");
            control.user_override = None;
            self.log_store_error("user_override_tier", self.state.set_user_override(None));
        }
        self.log_store_error("current_tier", self.state.set_current_tier(control.tier));
        self.log_store_error(
            "last_detection_time",
            self.state.set_last_detection_ms(wall_clock_ms()),
        );
        self.publish(control);
    }

    /// Select the starting tier from storage or a fresh detection.
    fn initialize(&self) -> Result<(), ControllerError> {
        let restored = self.sampler.restore_history(&self.state.performance_history());
        let persisted_runtime = self.state.total_runtime_seconds();

        let mut control = self.control.lock();
        control.total_runtime = Duration::from_secs(persisted_runtime);

        let last_detection = self.state.last_detection_ms();
        if should_detect(last_detection, wall_clock_ms(), self.settings.redetect_after) {
            info!(last_detection, "Running device capability detection");
            // A readable pin survives detection; an unreadable one is dropped by `detect`.
            control.user_override = self.state.user_override().unwrap_or(None);
            self.detect(&mut control);
        } else {
            control.user_override = self.state.user_override()?;
            let persisted = self.state.current_tier()?;
            control.tier = persisted.unwrap_or(Tier::Medium);
            control.emergency = false;
            info!(
                tier = %control.tier,
                from_storage = persisted.is_some(),
                "Restored quality tier"
            );
            self.publish(&control);
        }

        info!(
            restored_samples = restored,
            user_override = ?control.user_override,
            profile = control.active_profile().name,
            "Performance controller initialized"
        );
        Ok(())
    }

    fn enter_emergency(&self) {
        let mut control = self.control.lock();
        control.emergency = true;
        control.evaluator.reset();
        self.publish(&control);
    }

    /// One monitoring tick.
    pub(crate) fn tick(&self, now: Instant) -> Option<TierDecision> {
        let avg_fps = self.sampler.average_of_last(self.settings.evaluation_window);

        let mut control = self.control.lock();
        if let Some(last) = control.last_tick {
            control.total_runtime += now.saturating_duration_since(last);
        }
        control.last_tick = Some(now);

        if avg_fps <= 0.0 {
            return None;
        }
        if control.emergency || control.user_override.is_some() || !control.auto_adjust {
            return None;
        }

        let tier = control.tier;
        let target_fps = QualityProfileCatalog::profile_for(tier).target_fps;
        let decision = control.evaluator.evaluate(avg_fps, tier, target_fps, now)?;

        control.tier = decision.to;
        control.tier_changes += 1;
        control.last_decision = Some(decision);
        info!(
            from = %decision.from,
            to = %decision.to,
            reason = %decision.reason,
            avg_fps,
            target_fps,
            "Quality tier changed"
        );
        self.publish(&control);
        drop(control);

        self.log_store_error("current_tier", self.state.set_current_tier(decision.to));
        Some(decision)
    }

    fn mark_monitor_started(&self, now: Instant) {
        self.control.lock().last_tick = Some(now);
    }

    fn mark_monitor_stopped(&self) {
        self.control.lock().last_tick = None;
    }
}

/// Adaptive rendering performance controller.
///
/// Build with [`AdaptivePerformanceController::builder`]. Construction never
/// fails: if the persisted state cannot be restored the emergency profile is
/// published until the next successful detection.
///
/// Dropping the controller stops monitoring without flushing; call
/// [`shutdown`](Self::shutdown) first to persist session statistics.
pub struct AdaptivePerformanceController {
    shared: Arc<ControllerShared>,
    runtime: Option<Handle>,
    monitor: Mutex<Option<MonitorHandle>>,
}

impl AdaptivePerformanceController {
    pub fn builder() -> AdaptivePerformanceControllerBuilder {
        AdaptivePerformanceControllerBuilder::new()
    }

    pub(crate) fn from_parts(
        settings: PerformanceSettings,
        state: StateStore,
        probe: DeviceCapabilityProbe,
        runtime: Option<Handle>,
    ) -> Self {
        let auto_adjust = state.auto_adjust_enabled(settings.auto_adjust_default);
        let control = ControlState {
            tier: Tier::Medium,
            emergency: false,
            user_override: None,
            auto_adjust,
            evaluator: TierEvaluator::new(settings.crisis_cooldown, settings.hysteresis_window),
            device: None,
            total_runtime: Duration::ZERO,
            last_tick: None,
            tier_changes: 0,
            last_decision: None,
        };
        let (profile_tx, _) = watch::channel(QualityProfileCatalog::medium());

        let shared = Arc::new(ControllerShared {
            sampler: FrameRateSampler::new(settings.sample_capacity),
            settings,
            state,
            probe,
            control: Mutex::new(control),
            profile_tx,
        });

        let controller = Self {
            shared,
            runtime,
            monitor: Mutex::new(None),
        };

        if let Err(e) = controller.shared.initialize() {
            error!(error = %e, "Performance state restore failed, using emergency profile");
            controller.shared.enter_emergency();
        }

        if auto_adjust {
            controller.start_monitor();
        } else {
            info!("Automatic quality adjustment disabled");
        }

        controller
    }

    fn start_monitor(&self) {
        let Some(runtime) = self.runtime.as_ref() else {
            warn!("No tokio runtime available, performance monitoring not started");
            return;
        };

        let mut monitor = self.monitor.lock();
        if monitor.as_ref().is_some_and(MonitorHandle::is_running) {
            return;
        }
        self.shared.mark_monitor_started(Instant::now());
        *monitor = Some(MonitorHandle::spawn(Arc::clone(&self.shared), runtime));
    }

    fn stop_monitor(&self) {
        if let Some(handle) = self.monitor.lock().take() {
            handle.stop();
            self.shared.mark_monitor_stopped();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Profile access
    // ─────────────────────────────────────────────────────────────────────────

    /// The published quality profile.
    pub fn current_config(&self) -> Arc<QualityProfile> {
        self.shared.profile_tx.borrow().clone()
    }

    /// Receiver notified on every profile change.
    pub fn subscribe(&self) -> watch::Receiver<Arc<QualityProfile>> {
        self.shared.profile_tx.subscribe()
    }

    /// Tier of the published profile; `None` while in emergency.
    pub fn current_tier(&self) -> Option<Tier> {
        self.current_config().tier
    }

    /// The frame rate sampler fed by [`record_frame_performance`](Self::record_frame_performance).
    pub fn sampler(&self) -> &FrameRateSampler {
        &self.shared.sampler
    }

    // ─────────────────────────────────────────────────────────────────────────
    // User control
    // ─────────────────────────────────────────────────────────────────────────

    /// Pin the tier. Samples keep being collected but no automatic change
    /// is applied until the override is cleared.
    pub fn set_user_override(&self, tier: Tier) {
        let shared = &self.shared;
        let mut control = shared.control.lock();
        control.user_override = Some(tier);
        control.evaluator.clear_history();
        shared.log_store_error("user_override_tier", shared.state.set_user_override(Some(tier)));

        if control.emergency {
            warn!(%tier, "User override stored, emergency profile stays active until redetection");
        } else {
            info!(%tier, "User quality override set");
        }
        shared.publish(&control);
    }

    /// Remove the override and re-run device detection.
    pub fn clear_user_override(&self) {
        let shared = &self.shared;
        let mut control = shared.control.lock();
        control.user_override = None;
        shared.log_store_error("user_override_tier", shared.state.set_user_override(None));
        info!("User quality override cleared, redetecting");
        shared.detect(&mut control);
    }

    /// Enable or disable automatic tier changes; starts or stops monitoring.
    pub fn set_auto_adjust_enabled(&self, enabled: bool) {
        {
            let shared = &self.shared;
            let mut control = shared.control.lock();
            control.auto_adjust = enabled;
            shared.log_store_error(
                "auto_adjust_enabled",
                shared.state.set_auto_adjust_enabled(enabled),
            );
        }
        info!(enabled, "Automatic quality adjustment toggled");

        if enabled {
            self.start_monitor();
        } else {
            self.stop_monitor();
        }
    }

    pub fn is_auto_adjust_enabled(&self) -> bool {
        self.shared.control.lock().auto_adjust
    }

    /// Discard the stored detection and probe again.
    pub fn force_redetection(&self) {
        let shared = &self.shared;
        let mut control = shared.control.lock();
        shared.log_store_error("last_detection_time", shared.state.set_last_detection_ms(0));
        info!("Forced device redetection");
        shared.detect(&mut control);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Monitoring
    // ─────────────────────────────────────────────────────────────────────────

    /// Stop the monitoring task, e.g. when the app goes to the background.
    /// The persisted auto-adjust flag is untouched.
    pub fn pause_monitoring(&self) {
        debug!("Pausing performance monitoring");
        self.stop_monitor();
    }

    /// Restart monitoring if auto-adjust is enabled.
    pub fn resume_monitoring(&self) {
        if self.is_auto_adjust_enabled() {
            debug!("Resuming performance monitoring");
            self.start_monitor();
        } else {
            debug!("Auto-adjust disabled, not resuming monitoring");
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitor
            .lock()
            .as_ref()
            .is_some_and(MonitorHandle::is_running)
    }

    /// Feed one frame rate reading from the render loop.
    pub fn record_frame_performance(&self, fps: f32) {
        self.shared.sampler.record(fps);
    }

    /// Run one evaluation tick now.
    pub fn evaluate_now(&self) -> Option<TierDecision> {
        self.evaluate_at(Instant::now())
    }

    /// Run one evaluation tick as if at `now`.
    pub fn evaluate_at(&self, now: Instant) -> Option<TierDecision> {
        self.shared.tick(now)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Status and debugging
    // ─────────────────────────────────────────────────────────────────────────

    pub fn status(&self) -> PerformanceStatus {
        let profile = self.current_config();
        let sampler = &self.shared.sampler;
        let recent_fps = sampler.average_of_last(self.shared.settings.evaluation_window);
        let monitoring = self.is_monitoring();
        let control = self.shared.control.lock();

        PerformanceStatus {
            tier: profile.tier,
            profile: profile.name,
            target_fps: profile.target_fps,
            emergency: control.emergency,
            user_override: control.user_override,
            auto_adjust_enabled: control.auto_adjust,
            monitoring,
            recent_fps,
            average_fps: sampler.average(),
            current_fps: sampler.current_fps(),
            min_fps: sampler.min_fps(),
            max_fps: sampler.max_fps(),
            sample_count: sampler.len(),
            total_runtime_seconds: control.total_runtime.as_secs(),
            tier_changes: control.tier_changes,
            last_decision: control.last_decision,
            device: control.device.clone(),
        }
    }

    /// Crisis counters, cooldown and hysteresis state. Not a stable format.
    pub fn crisis_state_debug(&self) -> String {
        let control = self.shared.control.lock();
        let target_fps = control.active_profile().target_fps;
        format!(
            "Crisis state: {}",
            control.evaluator.debug_string(target_fps, Instant::now())
        )
    }

    /// Active profile parameters. Not a stable format.
    pub fn tier_config_debug(&self) -> String {
        let profile = self.current_config();
        let control = self.shared.control.lock();
        format!(
            "Tier config:\n  profile: {}\n  tier: {}\n  step: {}px\n  target: {} fps ({} us/frame)\n  \
             intensity: {:.2}\n  layers: atmosphere={} reflections={} shimmer={} specular={}\n  \
             load: {:.2}\n  override: {}\n  emergency: {}",
            profile.name,
            profile
                .tier
                .map_or_else(|| "off-ladder".to_string(), |t| t.to_string()),
            profile.step_size,
            profile.target_fps,
            profile.frame_interval().as_micros(),
            profile.effect_intensity,
            profile.atmosphere,
            profile.reflections,
            profile.shimmer,
            profile.specular,
            profile.computational_load(),
            control
                .user_override
                .map_or_else(|| "none".to_string(), |t| t.to_string()),
            control.emergency
        )
    }

    /// Specs from this session's detection. Not a stable format.
    pub fn device_specs_debug(&self) -> String {
        match &self.shared.control.lock().device {
            Some(specs) => specs.debug_summary(),
            None => "Device specs: not detected this session (tier restored from storage)"
                .to_string(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Benchmark the recorded frame rate against the active profile's target.
    pub async fn run_benchmark(
        &self,
        duration: Duration,
        cancel: CancellationToken,
    ) -> Result<BenchmarkReport, BenchmarkError> {
        let target_fps = self.current_config().target_fps;
        PerformanceBenchmark::new(duration, target_fps)
            .run(&self.shared.sampler, &cancel)
            .await
    }

    /// Stop monitoring and persist session statistics.
    pub fn shutdown(&self) {
        self.stop_monitor();

        let shared = &self.shared;
        let average_fps = shared.sampler.average();
        let history = shared.sampler.history_string();
        let runtime = shared.control.lock().total_runtime.as_secs();

        shared.log_store_error(
            "session",
            shared.state.save_session(average_fps, &history, runtime),
        );
        info!(
            average_fps,
            total_runtime_seconds = runtime,
            samples = shared.sampler.len(),
            "Performance controller shut down"
        );
    }
}

impl Drop for AdaptivePerformanceController {
    fn drop(&mut self) {
        if let Some(handle) = self.monitor.get_mut().take() {
            handle.stop();
        }
    }
}

impl std::fmt::Debug for AdaptivePerformanceController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptivePerformanceController")
            .field("profile", &self.current_config().name)
            .field("monitoring", &self.is_monitoring())
            .finish_non_exhaustive()
    }
}
