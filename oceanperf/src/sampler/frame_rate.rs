//! Rolling frame rate accumulator.
//!
//! The render loop calls [`FrameRateSampler::record`] once per frame while
//! the monitoring task reads averages from another thread. One mutex guards
//! the buffer and is only held for the append/evict or a copy-out.

use std::collections::VecDeque;
use std::time::Instant;

use parking_lot::Mutex;

use super::issues::{PerformanceIssues, ISSUE_WINDOW};

/// Default ring buffer capacity.
pub const DEFAULT_SAMPLE_CAPACITY: usize = 200;

/// Highest frame rate accepted as a real reading.
pub const MAX_VALID_FPS: f32 = 200.0;

/// Records between compactions of the buffer's spare allocation.
pub const COMPACT_EVERY: u64 = 100;

/// Records between min/max resets.
pub const EXTREMES_RESET_EVERY: u64 = 1000;

/// One frame rate reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameSample {
    /// When the sample was recorded.
    pub at: Instant,
    /// Instantaneous frames per second.
    pub fps: f32,
}

/// Whether a reading is inside the accepted `(0, 200]` range.
pub fn is_valid_fps(fps: f32) -> bool {
    fps > 0.0 && fps <= MAX_VALID_FPS
}

#[derive(Debug)]
struct SamplerInner {
    samples: VecDeque<FrameSample>,
    current: Option<f32>,
    min: Option<f32>,
    max: Option<f32>,
    records: u64,
}

/// Thread-safe bounded frame rate buffer with rolling statistics.
///
/// # Usage
///
/// ```
/// use oceanperf::sampler::FrameRateSampler;
///
/// let sampler = FrameRateSampler::new(200);
/// sampler.record(58.0);
/// sampler.record(62.0);
/// sampler.record(0.0); // ignored
///
/// assert_eq!(sampler.len(), 2);
/// assert_eq!(sampler.average_of_last(10), 60.0);
/// ```
#[derive(Debug)]
pub struct FrameRateSampler {
    capacity: usize,
    inner: Mutex<SamplerInner>,
}

impl FrameRateSampler {
    /// Create a sampler retaining at most `capacity` samples.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            inner: Mutex::new(SamplerInner {
                samples: VecDeque::with_capacity(capacity),
                current: None,
                min: None,
                max: None,
                records: 0,
            }),
        }
    }

    /// Create with [`DEFAULT_SAMPLE_CAPACITY`].
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_SAMPLE_CAPACITY)
    }

    /// Maximum number of retained samples.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Record one frame rate reading.
    ///
    /// Readings outside `(0, 200]` (and NaN) are sensor glitches and are
    /// dropped without touching any statistic.
    pub fn record(&self, fps: f32) {
        if !is_valid_fps(fps) {
            return;
        }

        let mut inner = self.inner.lock();
        inner.samples.push_back(FrameSample {
            at: Instant::now(),
            fps,
        });
        while inner.samples.len() > self.capacity {
            inner.samples.pop_front();
        }

        inner.records += 1;
        inner.current = Some(fps);

        if inner.records % EXTREMES_RESET_EVERY == 0 {
            inner.min = Some(fps);
            inner.max = Some(fps);
        } else {
            inner.min = Some(inner.min.map_or(fps, |m| m.min(fps)));
            inner.max = Some(inner.max.map_or(fps, |m| m.max(fps)));
        }

        if inner.records % COMPACT_EVERY == 0 {
            let capacity = self.capacity;
            inner.samples.shrink_to(capacity);
        }
    }

    /// Most recent accepted reading, or 0 if none.
    pub fn current_fps(&self) -> f32 {
        self.inner.lock().current.unwrap_or(0.0)
    }

    /// Lowest reading since the last extremes reset, or 0 if none.
    pub fn min_fps(&self) -> f32 {
        self.inner.lock().min.unwrap_or(0.0)
    }

    /// Highest reading since the last extremes reset, or 0 if none.
    pub fn max_fps(&self) -> f32 {
        self.inner.lock().max.unwrap_or(0.0)
    }

    /// Mean of the last `n` retained samples, or 0 if empty.
    pub fn average_of_last(&self, n: usize) -> f32 {
        let inner = self.inner.lock();
        let take = n.min(inner.samples.len());
        if take == 0 {
            return 0.0;
        }
        let sum: f32 = inner.samples.iter().rev().take(take).map(|s| s.fps).sum();
        sum / take as f32
    }

    /// Mean of the samples recorded at or after `since`, if any.
    pub fn average_since(&self, since: Instant) -> Option<f32> {
        let inner = self.inner.lock();
        let (sum, count) = inner
            .samples
            .iter()
            .rev()
            .take_while(|s| s.at >= since)
            .fold((0.0f32, 0usize), |(sum, count), s| (sum + s.fps, count + 1));
        (count > 0).then(|| sum / count as f32)
    }

    /// Mean of every retained sample, or 0 if empty.
    pub fn average(&self) -> f32 {
        self.average_of_last(self.capacity)
    }

    /// Number of retained samples.
    pub fn len(&self) -> usize {
        self.inner.lock().samples.len()
    }

    /// Whether no samples are retained.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total accepted readings since creation.
    pub fn total_records(&self) -> u64 {
        self.inner.lock().records
    }

    /// Copy of the retained readings, oldest first.
    pub fn samples(&self) -> Vec<f32> {
        self.inner.lock().samples.iter().map(|s| s.fps).collect()
    }

    /// Copy of the last `n` retained readings, oldest first.
    pub fn last_samples(&self, n: usize) -> Vec<f32> {
        let inner = self.inner.lock();
        let skip = inner.samples.len().saturating_sub(n);
        inner.samples.iter().skip(skip).map(|s| s.fps).collect()
    }

    /// Classify recent frame rate problems.
    ///
    /// Looks at the last 120 samples and needs at least 60 of them;
    /// otherwise the verdict is neutral.
    pub fn detect_issues(&self) -> PerformanceIssues {
        let window = self.last_samples(ISSUE_WINDOW);
        PerformanceIssues::analyze(&window)
    }

    /// Drop every sample and statistic.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.samples.clear();
        inner.current = None;
        inner.min = None;
        inner.max = None;
    }

    /// Serialize retained readings as a comma-separated list.
    pub fn history_string(&self) -> String {
        self.samples()
            .iter()
            .map(|fps| format!("{:.1}", fps))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Replay a serialized history through [`record`](Self::record).
    ///
    /// Unparsable or out-of-range entries are skipped. Returns the number
    /// of samples restored.
    pub fn restore_history(&self, history: &str) -> usize {
        let mut restored = 0;
        for fps in history
            .split(',')
            .filter_map(|entry| entry.trim().parse::<f32>().ok())
            .filter(|fps| is_valid_fps(*fps))
        {
            self.record(fps);
            restored += 1;
        }
        restored
    }
}

impl Default for FrameRateSampler {
    fn default() -> Self {
        Self::with_defaults()
    }
}
