//! Typed access to the persisted performance state.
//!
//! Reads never fail on a missing key: each value has a default. Backend
//! failures on read are logged and treated as missing. Only tier keys report
//! corruption, since a bad tier must push the controller into its emergency
//! profile rather than silently pick a default.

use std::sync::Arc;

use serde::Serialize;
use tracing::warn;

use super::error::{StoreError, StoreResult};
use super::{keys, PreferenceStore};
use crate::quality::Tier;

/// Snapshot of every persisted key, as stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PersistedState {
    pub current_tier: Option<String>,
    pub user_override_tier: Option<String>,
    pub last_detection_time: Option<String>,
    pub total_runtime_seconds: Option<String>,
    pub average_fps: Option<String>,
    pub performance_history: Option<String>,
    pub auto_adjust_enabled: Option<String>,
}

/// Typed wrapper over a [`PreferenceStore`].
#[derive(Clone)]
pub struct StateStore {
    backend: Arc<dyn PreferenceStore>,
}

impl StateStore {
    pub fn new(backend: Arc<dyn PreferenceStore>) -> Self {
        Self { backend }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &Arc<dyn PreferenceStore> {
        &self.backend
    }

    fn read(&self, key: &'static str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value.filter(|v| !v.trim().is_empty()),
            Err(e) => {
                warn!(key, error = %e, "Failed to read persisted value, using default");
                None
            }
        }
    }

    fn read_parsed<T: std::str::FromStr>(&self, key: &'static str, default: T) -> T {
        match self.read(key) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(key, value = %raw, "Ignoring malformed persisted value");
                default
            }),
            None => default,
        }
    }

    fn read_tier(&self, key: &'static str) -> StoreResult<Option<Tier>> {
        match self.read(key) {
            Some(raw) => raw
                .parse::<Tier>()
                .map(Some)
                .map_err(|_| StoreError::Corrupt { key, value: raw }),
            None => Ok(None),
        }
    }

    /// Last tier the controller applied.
    pub fn current_tier(&self) -> StoreResult<Option<Tier>> {
        self.read_tier(keys::CURRENT_TIER)
    }

    /// Tier pinned by the user, if any.
    pub fn user_override(&self) -> StoreResult<Option<Tier>> {
        self.read_tier(keys::USER_OVERRIDE_TIER)
    }

    /// Wall-clock time of the last capability detection, epoch ms (0 = never).
    pub fn last_detection_ms(&self) -> i64 {
        self.read_parsed(keys::LAST_DETECTION_TIME, 0)
    }

    pub fn total_runtime_seconds(&self) -> u64 {
        self.read_parsed(keys::TOTAL_RUNTIME_SECONDS, 0)
    }

    pub fn average_fps(&self) -> f32 {
        self.read_parsed(keys::AVERAGE_FPS, 0.0)
    }

    /// Comma-separated fps history, empty when never saved.
    pub fn performance_history(&self) -> String {
        self.read(keys::PERFORMANCE_HISTORY).unwrap_or_default()
    }

    /// Whether automatic tier changes are allowed (default on).
    pub fn auto_adjust_enabled(&self, default: bool) -> bool {
        self.read_parsed(keys::AUTO_ADJUST_ENABLED, default)
    }

    pub fn set_current_tier(&self, tier: Tier) -> StoreResult<()> {
        self.backend.set(keys::CURRENT_TIER, tier.as_str())
    }

    pub fn set_user_override(&self, tier: Option<Tier>) -> StoreResult<()> {
        match tier {
            Some(tier) => self.backend.set(keys::USER_OVERRIDE_TIER, tier.as_str()),
            None => self.backend.remove(keys::USER_OVERRIDE_TIER),
        }
    }

    pub fn set_last_detection_ms(&self, epoch_ms: i64) -> StoreResult<()> {
        self.backend
            .set(keys::LAST_DETECTION_TIME, &epoch_ms.to_string())
    }

    pub fn set_auto_adjust_enabled(&self, enabled: bool) -> StoreResult<()> {
        self.backend
            .set(keys::AUTO_ADJUST_ENABLED, if enabled { "true" } else { "false" })
    }

    /// Write the session statistics in one batch.
    pub fn save_session(
        &self,
        average_fps: f32,
        history: &str,
        total_runtime_seconds: u64,
    ) -> StoreResult<()> {
        self.backend.set_many(&[
            (keys::AVERAGE_FPS, format!("{:.1}", average_fps)),
            (keys::PERFORMANCE_HISTORY, history.to_string()),
            (keys::TOTAL_RUNTIME_SECONDS, total_runtime_seconds.to_string()),
        ])
    }

    /// Raw view of every key.
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            current_tier: self.read(keys::CURRENT_TIER),
            user_override_tier: self.read(keys::USER_OVERRIDE_TIER),
            last_detection_time: self.read(keys::LAST_DETECTION_TIME),
            total_runtime_seconds: self.read(keys::TOTAL_RUNTIME_SECONDS),
            average_fps: self.read(keys::AVERAGE_FPS),
            performance_history: self.read(keys::PERFORMANCE_HISTORY),
            auto_adjust_enabled: self.read(keys::AUTO_ADJUST_ENABLED),
        }
    }

    /// Remove every key.
    pub fn reset(&self) -> StoreResult<()> {
        for key in keys::ALL {
            self.backend.remove(key)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for StateStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateStore").finish_non_exhaustive()
    }
}
