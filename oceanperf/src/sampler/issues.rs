//! Frame rate issue classification.

use std::fmt;

use serde::Serialize;

/// Number of most recent samples inspected.
pub const ISSUE_WINDOW: usize = 120;

/// Minimum samples within the window for a verdict.
pub const MIN_SAMPLES_FOR_VERDICT: usize = 60;

/// Average below which the frame rate counts as low.
pub const LOW_AVERAGE_FPS: f32 = 15.0;

/// Standard deviation above which the frame rate counts as unstable.
pub const INSTABILITY_STDDEV: f32 = 8.0;

/// A sample below this fraction of the average is a spike.
pub const SPIKE_FRACTION: f32 = 0.5;

/// Spike ratio above which the frame rate counts as spiky.
pub const SPIKE_RATIO_THRESHOLD: f32 = 0.05;

/// Number of trailing samples checked for consistent drops.
pub const DROP_WINDOW: usize = 30;

/// Frame rate below which a trailing sample counts as dropped.
pub const DROP_FPS: f32 = 12.0;

/// More than this many dropped samples is a consistent drop.
pub const DROP_COUNT_THRESHOLD: usize = 15;

/// Ordered issue severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
pub enum Severity {
    #[default]
    None,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::None => "none",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of [`FrameRateSampler::detect_issues`](super::FrameRateSampler::detect_issues).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceIssues {
    /// Overall severity (highest matching condition).
    pub severity: Severity,

    /// Whether enough samples were available for a verdict.
    pub sufficient_data: bool,

    /// Mean of the inspected window.
    pub average_fps: f32,

    /// Standard deviation of the inspected window.
    pub std_dev: f32,

    /// Fraction of window samples below half the average.
    pub spike_ratio: f32,

    /// Trailing samples below [`DROP_FPS`].
    pub consistent_drops: usize,

    pub low_average: bool,
    pub unstable: bool,
    pub spiky: bool,
    pub dropping: bool,
}

impl PerformanceIssues {
    /// Neutral verdict used when there is not enough data.
    pub fn insufficient_data() -> Self {
        Self::default()
    }

    /// Whether any issue was found.
    pub fn has_issues(&self) -> bool {
        self.severity > Severity::None
    }

    /// Classify a window of samples (oldest first).
    pub fn analyze(window: &[f32]) -> Self {
        if window.len() < MIN_SAMPLES_FOR_VERDICT {
            return Self::insufficient_data();
        }

        let count = window.len() as f32;
        let average = window.iter().sum::<f32>() / count;
        let variance = window
            .iter()
            .map(|fps| (fps - average).powi(2))
            .sum::<f32>()
            / count;
        let std_dev = variance.sqrt();

        let spike_limit = average * SPIKE_FRACTION;
        let spikes = window.iter().filter(|fps| **fps < spike_limit).count();
        let spike_ratio = spikes as f32 / count;

        let tail_start = window.len().saturating_sub(DROP_WINDOW);
        let consistent_drops = window[tail_start..]
            .iter()
            .filter(|fps| **fps < DROP_FPS)
            .count();

        let low_average = average < LOW_AVERAGE_FPS;
        let unstable = std_dev > INSTABILITY_STDDEV;
        let spiky = spike_ratio > SPIKE_RATIO_THRESHOLD;
        let dropping = consistent_drops > DROP_COUNT_THRESHOLD;

        let severity = if dropping || (low_average && unstable) {
            Severity::Critical
        } else if low_average {
            Severity::High
        } else if unstable || spiky {
            Severity::Medium
        } else {
            Severity::None
        };

        Self {
            severity,
            sufficient_data: true,
            average_fps: average,
            std_dev,
            spike_ratio,
            consistent_drops,
            low_average,
            unstable,
            spiky,
            dropping,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_data_is_neutral() {
        let issues = PerformanceIssues::analyze(&[5.0; 59]);
        assert!(!issues.sufficient_data);
        assert_eq!(issues.severity, Severity::None);
        assert!(!issues.has_issues());
    }

    #[test]
    fn test_steady_frame_rate_has_no_issues() {
        let issues = PerformanceIssues::analyze(&[58.0; 120]);
        assert!(issues.sufficient_data);
        assert_eq!(issues.severity, Severity::None);
        assert!((issues.average_fps - 58.0).abs() < 1e-4);
        assert!(issues.std_dev < 1e-4);
    }

    #[test]
    fn test_low_average_is_high() {
        let issues = PerformanceIssues::analyze(&[14.0; 100]);
        assert!(issues.low_average);
        assert!(!issues.dropping);
        assert_eq!(issues.severity, Severity::High);
    }

    #[test]
    fn test_consistent_drops_are_critical() {
        let mut window = vec![40.0; 90];
        window.extend(std::iter::repeat(10.0).take(20));
        let issues = PerformanceIssues::analyze(&window);
        assert_eq!(issues.consistent_drops, 20);
        assert!(issues.dropping);
        assert_eq!(issues.severity, Severity::Critical);
    }

    #[test]
    fn test_instability_is_medium() {
        // Alternating 40/60: average 50, stddev 10, no sample below 25
        let window: Vec<f32> = (0..120)
            .map(|i| if i % 2 == 0 { 40.0 } else { 60.0 })
            .collect();
        let issues = PerformanceIssues::analyze(&window);
        assert!(issues.unstable);
        assert!(!issues.spiky);
        assert_eq!(issues.severity, Severity::Medium);
    }

    #[test]
    fn test_spikes_are_medium() {
        // 10 of 100 samples collapse to 5 fps
        let window: Vec<f32> = (0..100)
            .map(|i| if i % 10 == 0 { 5.0 } else { 30.0 })
            .collect();
        let issues = PerformanceIssues::analyze(&window);
        assert!(issues.spiky);
        assert!(issues.severity >= Severity::Medium);
    }

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::None < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
        assert!(Severity::High < Severity::Critical);
    }
}
