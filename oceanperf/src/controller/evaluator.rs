//! Two-phase tier evaluation.
//!
//! Each monitoring tick feeds one averaged frame rate into
//! [`TierEvaluator::evaluate`]. The evaluator owns all decision state and
//! takes the current time as an argument, so every timing rule can be
//! exercised without sleeping.
//!
//! # Decision Flow
//!
//! ```text
//!  avg ──► Phase 1: crisis ──────────────────────► downgrade (return)
//!            │ critical: avg < max(20% target, 15), cooldown elapsed
//!            │ severe:   avg < max(35% target, 20), 2 in a row, cooldown elapsed
//!            ▼ no crisis
//!          Phase 2: steady state (4 readings)
//!            │ >= 3 below downgrade threshold ───► downgrade
//!            │ all 4 above upgrade threshold ────► upgrade
//!            ▼
//!          no change
//! ```
//!
//! Within the hysteresis window after a change, the threshold that would
//! reverse it moves: after an upgrade the downgrade threshold is 75% of
//! target, after a downgrade the upgrade threshold is 125%.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::constants::*;
use crate::quality::Tier;

/// Direction of a tier change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Up,
    Down,
}

/// Why the evaluator asked for a change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DecisionReason {
    CriticalCrisis,
    SevereCrisis,
    SustainedLow,
    SustainedHigh,
}

impl DecisionReason {
    pub fn is_crisis(&self) -> bool {
        matches!(self, Self::CriticalCrisis | Self::SevereCrisis)
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::CriticalCrisis => "critical crisis",
            Self::SevereCrisis => "severe crisis",
            Self::SustainedLow => "sustained low frame rate",
            Self::SustainedHigh => "sustained headroom",
        };
        f.write_str(s)
    }
}

/// A one-step tier change requested by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TierDecision {
    pub from: Tier,
    pub to: Tier,
    pub reason: DecisionReason,
}

impl TierDecision {
    pub fn direction(&self) -> Direction {
        if self.to > self.from {
            Direction::Up
        } else {
            Direction::Down
        }
    }
}

/// Thresholds in effect for one steady-state decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub downgrade_below: f32,
    pub upgrade_above: f32,
}

/// Critical crisis threshold for a target frame rate.
pub fn critical_threshold(target_fps: u32) -> f32 {
    (target_fps as f32 * CRITICAL_CRISIS_RATIO).max(CRITICAL_CRISIS_FLOOR_FPS)
}

/// Severe crisis threshold for a target frame rate.
pub fn severe_threshold(target_fps: u32) -> f32 {
    (target_fps as f32 * SEVERE_CRISIS_RATIO).max(SEVERE_CRISIS_FLOOR_FPS)
}

/// Stateful two-phase evaluator.
#[derive(Debug)]
pub struct TierEvaluator {
    crisis_cooldown: Duration,
    hysteresis_window: Duration,
    history: VecDeque<f32>,
    severe_count: u32,
    last_crisis_at: Option<Instant>,
    last_change: Option<(Direction, Instant)>,
}

impl TierEvaluator {
    pub fn new(crisis_cooldown: Duration, hysteresis_window: Duration) -> Self {
        Self {
            crisis_cooldown,
            hysteresis_window,
            history: VecDeque::with_capacity(EVALUATION_HISTORY_SIZE),
            severe_count: 0,
            last_crisis_at: None,
            last_change: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_CRISIS_COOLDOWN, DEFAULT_HYSTERESIS_WINDOW)
    }

    /// Run one evaluation pass.
    ///
    /// Returns the change to apply, if any. The caller is expected to apply
    /// it; the evaluator has already updated its own bookkeeping.
    pub fn evaluate(
        &mut self,
        avg_fps: f32,
        tier: Tier,
        target_fps: u32,
        now: Instant,
    ) -> Option<TierDecision> {
        if let Some(decision) = self.check_crisis(avg_fps, tier, target_fps, now) {
            return Some(decision);
        }
        self.check_steady_state(avg_fps, tier, target_fps, now)
    }

    fn cooldown_elapsed(&self, now: Instant) -> bool {
        match self.last_crisis_at {
            Some(at) => now.saturating_duration_since(at) >= self.crisis_cooldown,
            None => true,
        }
    }

    fn check_crisis(
        &mut self,
        avg_fps: f32,
        tier: Tier,
        target_fps: u32,
        now: Instant,
    ) -> Option<TierDecision> {
        let at_floor = tier.is_lowest();

        if !at_floor && avg_fps < critical_threshold(target_fps) && self.cooldown_elapsed(now) {
            return Some(self.crisis_downgrade(tier, DecisionReason::CriticalCrisis, now));
        }

        if !at_floor && avg_fps < severe_threshold(target_fps) {
            self.severe_count += 1;
            if self.severe_count >= SEVERE_READINGS_REQUIRED && self.cooldown_elapsed(now) {
                return Some(self.crisis_downgrade(tier, DecisionReason::SevereCrisis, now));
            }
        } else {
            self.severe_count = 0;
        }

        None
    }

    fn crisis_downgrade(&mut self, tier: Tier, reason: DecisionReason, now: Instant) -> TierDecision {
        self.last_crisis_at = Some(now);
        self.severe_count = 0;
        self.history.clear();
        TierDecision {
            from: tier,
            to: tier.downgrade(),
            reason,
        }
    }

    /// Thresholds for a steady-state decision at `now`.
    pub fn thresholds(&self, target_fps: u32, now: Instant) -> Thresholds {
        let target = target_fps as f32;
        let mut downgrade_ratio = DOWNGRADE_RATIO;
        let mut upgrade_ratio = UPGRADE_RATIO;

        if let Some((direction, at)) = self.last_change {
            if now.saturating_duration_since(at) < self.hysteresis_window {
                match direction {
                    Direction::Up => downgrade_ratio = HYSTERESIS_DOWNGRADE_RATIO,
                    Direction::Down => upgrade_ratio = HYSTERESIS_UPGRADE_RATIO,
                }
            }
        }

        Thresholds {
            downgrade_below: target * downgrade_ratio,
            upgrade_above: target * upgrade_ratio,
        }
    }

    fn check_steady_state(
        &mut self,
        avg_fps: f32,
        tier: Tier,
        target_fps: u32,
        now: Instant,
    ) -> Option<TierDecision> {
        if self.history.len() == EVALUATION_HISTORY_SIZE {
            self.history.pop_front();
        }
        self.history.push_back(avg_fps);
        if self.history.len() < EVALUATION_HISTORY_SIZE {
            return None;
        }

        let thresholds = self.thresholds(target_fps, now);
        let below = self
            .history
            .iter()
            .filter(|&&fps| fps < thresholds.downgrade_below)
            .count();
        let above = self
            .history
            .iter()
            .filter(|&&fps| fps > thresholds.upgrade_above)
            .count();

        let decision = if below >= DOWNGRADE_VOTES_REQUIRED && !tier.is_lowest() {
            TierDecision {
                from: tier,
                to: tier.downgrade(),
                reason: DecisionReason::SustainedLow,
            }
        } else if above == EVALUATION_HISTORY_SIZE && !tier.is_highest() {
            TierDecision {
                from: tier,
                to: tier.upgrade(),
                reason: DecisionReason::SustainedHigh,
            }
        } else {
            return None;
        };

        self.last_change = Some((decision.direction(), now));
        self.history.clear();
        Some(decision)
    }

    /// Forget steady-state readings (after any externally applied change).
    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Forget everything, including crisis and hysteresis timing.
    pub fn reset(&mut self) {
        self.history.clear();
        self.severe_count = 0;
        self.last_crisis_at = None;
        self.last_change = None;
    }

    pub fn history(&self) -> Vec<f32> {
        self.history.iter().copied().collect()
    }

    pub fn severe_count(&self) -> u32 {
        self.severe_count
    }

    pub fn last_crisis_at(&self) -> Option<Instant> {
        self.last_crisis_at
    }

    pub fn last_change(&self) -> Option<(Direction, Instant)> {
        self.last_change
    }

    /// Human-readable crisis and hysteresis state.
    pub fn debug_string(&self, target_fps: u32, now: Instant) -> String {
        let cooldown = match self.last_crisis_at {
            Some(at) => {
                let remaining = self
                    .crisis_cooldown
                    .saturating_sub(now.saturating_duration_since(at));
                format!("{:.1}s remaining", remaining.as_secs_f32())
            }
            None => "ready".to_string(),
        };
        let last_change = match self.last_change {
            Some((direction, at)) => format!(
                "{:?} {:.1}s ago",
                direction,
                now.saturating_duration_since(at).as_secs_f32()
            ),
            None => "none".to_string(),
        };
        let thresholds = self.thresholds(target_fps, now);
        format!(
            "critical<{:.1} severe<{:.1} severe_count={} cooldown={} \
             downgrade<{:.1} upgrade>{:.1} history={:?} last_change={}",
            critical_threshold(target_fps),
            severe_threshold(target_fps),
            self.severe_count,
            cooldown,
            thresholds.downgrade_below,
            thresholds.upgrade_above,
            self.history,
            last_change
        )
    }
}

impl Default for TierEvaluator {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TARGET: u32 = 30;

    fn seeded(readings: &[f32]) -> TierEvaluator {
        let mut evaluator = TierEvaluator::with_defaults();
        evaluator.history.extend(readings.iter().copied());
        evaluator
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Thresholds
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_crisis_thresholds_use_floor() {
        assert_eq!(critical_threshold(30), 15.0);
        assert_eq!(severe_threshold(30), 20.0);
        assert_eq!(critical_threshold(100), 20.0);
        assert_eq!(severe_threshold(100), 35.0);
    }

    #[test]
    fn test_base_thresholds() {
        let evaluator = TierEvaluator::with_defaults();
        let t = evaluator.thresholds(TARGET, Instant::now());
        assert!((t.downgrade_below - 19.5).abs() < 1e-4);
        assert!((t.upgrade_above - 49.5).abs() < 1e-4);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Phase 1: crisis
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_critical_crisis_downgrades_once() {
        let mut evaluator = seeded(&[28.0, 27.0]);
        let now = Instant::now();

        let decision = evaluator.evaluate(5.0, Tier::Medium, TARGET, now).unwrap();
        assert_eq!(decision.from, Tier::Medium);
        assert_eq!(decision.to, Tier::Low);
        assert_eq!(decision.reason, DecisionReason::CriticalCrisis);
        assert!(evaluator.history().is_empty());
        assert_eq!(evaluator.last_crisis_at(), Some(now));
        assert_eq!(evaluator.severe_count(), 0);
    }

    #[test]
    fn test_critical_crisis_respects_cooldown() {
        let mut evaluator = TierEvaluator::with_defaults();
        let start = Instant::now();

        assert!(evaluator.evaluate(5.0, Tier::High, TARGET, start).is_some());

        // Within cooldown: critical is suppressed, severe counter builds but
        // cannot fire either.
        let soon = start + Duration::from_secs(3);
        assert!(evaluator.evaluate(5.0, Tier::Medium, TARGET, soon).is_none());
        let sooner = start + Duration::from_secs(6);
        assert!(evaluator.evaluate(5.0, Tier::Medium, TARGET, sooner).is_none());
        assert_eq!(evaluator.severe_count(), 2);

        let later = start + DEFAULT_CRISIS_COOLDOWN;
        let decision = evaluator.evaluate(5.0, Tier::Medium, TARGET, later).unwrap();
        assert_eq!(decision.to, Tier::Low);
        assert_eq!(decision.reason, DecisionReason::CriticalCrisis);
    }

    #[test]
    fn test_severe_crisis_needs_two_consecutive() {
        let mut evaluator = TierEvaluator::with_defaults();
        let now = Instant::now();

        // 18 fps: below severe (20) but above critical (15)
        assert!(evaluator.evaluate(18.0, Tier::Medium, TARGET, now).is_none());
        assert_eq!(evaluator.severe_count(), 1);

        let decision = evaluator
            .evaluate(18.0, Tier::Medium, TARGET, now + Duration::from_secs(3))
            .unwrap();
        assert_eq!(decision.reason, DecisionReason::SevereCrisis);
        assert_eq!(decision.to, Tier::Low);
        assert_eq!(evaluator.severe_count(), 0);
    }

    #[test]
    fn test_severe_counter_resets_on_recovery() {
        let mut evaluator = TierEvaluator::with_defaults();
        let now = Instant::now();

        assert!(evaluator.evaluate(18.0, Tier::Medium, TARGET, now).is_none());
        assert_eq!(evaluator.severe_count(), 1);

        // One non-qualifying reading resets the counter
        assert!(evaluator
            .evaluate(28.0, Tier::Medium, TARGET, now + Duration::from_secs(3))
            .is_none());
        assert_eq!(evaluator.severe_count(), 0);

        assert!(evaluator
            .evaluate(18.0, Tier::Medium, TARGET, now + Duration::from_secs(6))
            .is_none());
        assert_eq!(evaluator.severe_count(), 1);
    }

    #[test]
    fn test_no_crisis_at_lowest_tier() {
        let mut evaluator = TierEvaluator::with_defaults();
        let now = Instant::now();
        for i in 0..6 {
            let decision =
                evaluator.evaluate(2.0, Tier::VeryLow, TARGET, now + Duration::from_secs(i * 3));
            assert!(decision.is_none());
        }
        assert_eq!(evaluator.severe_count(), 0);
        assert!(evaluator.last_crisis_at().is_none());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Phase 2: steady state
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_waits_for_full_history() {
        let mut evaluator = TierEvaluator::with_defaults();
        let now = Instant::now();
        for _ in 0..3 {
            assert!(evaluator.evaluate(60.0, Tier::Medium, TARGET, now).is_none());
        }
        assert_eq!(evaluator.history().len(), 3);
    }

    #[test]
    fn test_three_of_four_below_downgrades() {
        let mut evaluator = seeded(&[19.0, 19.0, 19.0]);
        let decision = evaluator
            .evaluate(25.0, Tier::Medium, TARGET, Instant::now())
            .unwrap();
        assert_eq!(decision.to, Tier::Low);
        assert_eq!(decision.reason, DecisionReason::SustainedLow);
        assert!(evaluator.history().is_empty());
    }

    #[test]
    fn test_downgrade_is_order_independent() {
        let mut evaluator = seeded(&[25.0, 19.0, 19.0]);
        let decision = evaluator
            .evaluate(19.0, Tier::Medium, TARGET, Instant::now())
            .unwrap();
        assert_eq!(decision.to, Tier::Low);
        assert_eq!(decision.reason, DecisionReason::SustainedLow);
        assert!(evaluator.history().is_empty());
    }

    #[test]
    fn test_two_of_four_below_holds() {
        let mut evaluator = seeded(&[19.0, 25.0, 19.0]);
        assert!(evaluator
            .evaluate(25.0, Tier::Medium, TARGET, Instant::now())
            .is_none());
        assert_eq!(evaluator.history().len(), 4);
    }

    #[test]
    fn test_upgrade_requires_all_four_above() {
        let mut evaluator = seeded(&[50.0, 50.0, 50.0]);
        assert!(evaluator
            .evaluate(45.0, Tier::Medium, TARGET, Instant::now())
            .is_none());

        let mut evaluator = seeded(&[50.0, 50.0, 50.0]);
        let decision = evaluator
            .evaluate(50.0, Tier::Medium, TARGET, Instant::now())
            .unwrap();
        assert_eq!(decision.to, Tier::High);
        assert_eq!(decision.reason, DecisionReason::SustainedHigh);
        assert_eq!(decision.direction(), Direction::Up);
    }

    #[test]
    fn test_ladder_ends_are_absorbing() {
        let mut evaluator = seeded(&[60.0, 60.0, 60.0]);
        assert!(evaluator
            .evaluate(60.0, Tier::High, TARGET, Instant::now())
            .is_none());

        let mut evaluator = seeded(&[19.0, 19.0, 19.0]);
        assert!(evaluator
            .evaluate(19.0, Tier::VeryLow, TARGET, Instant::now())
            .is_none());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Hysteresis
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_after_upgrade_downgrade_threshold_rises() {
        let start = Instant::now();
        let mut evaluator = TierEvaluator::with_defaults();
        evaluator.last_change = Some((Direction::Up, start));

        let t = evaluator.thresholds(TARGET, start + Duration::from_secs(5));
        assert!((t.downgrade_below - 22.5).abs() < 1e-4);
        assert!((t.upgrade_above - 49.5).abs() < 1e-4);
    }

    #[test]
    fn test_reading_of_20_counts_only_under_hysteresis() {
        let start = Instant::now();

        // Normal regime: 20 > 19.5, so three 20s are not below threshold
        let mut normal = seeded(&[20.0, 20.0, 20.0]);
        assert!(normal
            .evaluate(40.0, Tier::High, TARGET, start)
            .is_none());

        // Just after an upgrade: 20 < 22.5, so the same readings downgrade
        let mut recent = seeded(&[20.0, 20.0, 20.0]);
        recent.last_change = Some((Direction::Up, start));
        let decision = recent
            .evaluate(40.0, Tier::High, TARGET, start + Duration::from_secs(5))
            .unwrap();
        assert_eq!(decision.to, Tier::Medium);
        assert_eq!(decision.reason, DecisionReason::SustainedLow);
    }

    #[test]
    fn test_after_downgrade_upgrade_threshold_drops() {
        let start = Instant::now();
        let mut evaluator = seeded(&[40.0, 40.0, 40.0]);
        evaluator.last_change = Some((Direction::Down, start));

        let decision = evaluator
            .evaluate(40.0, Tier::Low, TARGET, start + Duration::from_secs(10))
            .unwrap();
        assert_eq!(decision.to, Tier::Medium);
    }

    #[test]
    fn test_hysteresis_expires() {
        let start = Instant::now();
        let mut evaluator = seeded(&[40.0, 40.0, 40.0]);
        evaluator.last_change = Some((Direction::Down, start));

        assert!(evaluator
            .evaluate(40.0, Tier::Low, TARGET, start + DEFAULT_HYSTERESIS_WINDOW)
            .is_none());
    }

    #[test]
    fn test_steady_change_records_direction() {
        let now = Instant::now();
        let mut evaluator = seeded(&[19.0, 19.0, 19.0]);
        evaluator.evaluate(19.0, Tier::Medium, TARGET, now);
        assert_eq!(evaluator.last_change(), Some((Direction::Down, now)));
    }

    #[test]
    fn test_reset_clears_everything() {
        let now = Instant::now();
        let mut evaluator = seeded(&[19.0, 19.0]);
        evaluator.severe_count = 1;
        evaluator.last_crisis_at = Some(now);
        evaluator.last_change = Some((Direction::Up, now));

        evaluator.reset();
        assert!(evaluator.history().is_empty());
        assert_eq!(evaluator.severe_count(), 0);
        assert!(evaluator.last_crisis_at().is_none());
        assert!(evaluator.last_change().is_none());
    }

    #[test]
    fn test_debug_string_mentions_state() {
        let evaluator = seeded(&[30.0]);
        let s = evaluator.debug_string(TARGET, Instant::now());
        assert!(s.contains("severe_count=0"));
        assert!(s.contains("cooldown=ready"));
        assert!(s.contains("last_change=none"));
    }
}
