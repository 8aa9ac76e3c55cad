//! Controller status snapshot for tooling and logs.

use serde::Serialize;

use super::evaluator::TierDecision;
use crate::device::DeviceSpecs;
use crate::quality::Tier;

/// Point-in-time view of the controller.
///
/// All fields are public and the struct serializes to JSON for the CLI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceStatus {
    /// Active tier; `None` while the emergency profile is active.
    pub tier: Option<Tier>,

    /// Name of the published profile.
    pub profile: &'static str,

    /// Target frame rate of the published profile.
    pub target_fps: u32,

    /// Whether the emergency profile is active.
    pub emergency: bool,

    /// Tier pinned by the user.
    pub user_override: Option<Tier>,

    /// Persisted auto-adjust switch.
    pub auto_adjust_enabled: bool,

    /// Whether the monitoring task is running.
    pub monitoring: bool,

    /// Average over the evaluation window.
    pub recent_fps: f32,

    /// Average over all retained samples.
    pub average_fps: f32,

    pub current_fps: f32,
    pub min_fps: f32,
    pub max_fps: f32,

    /// Retained sample count.
    pub sample_count: usize,

    /// Monitored seconds, including previous sessions.
    pub total_runtime_seconds: u64,

    /// Tier changes applied this session.
    pub tier_changes: u64,

    /// Most recent change made by the evaluator.
    pub last_decision: Option<TierDecision>,

    /// Specs from the last detection in this session.
    pub device: Option<DeviceSpecs>,
}
