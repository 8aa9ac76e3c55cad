//! Fixed-length frame rate benchmark.
//!
//! Observes a [`FrameRateSampler`] that something else is feeding: waits out
//! a warm-up, then takes one reading per polling interval (the average of
//! the samples recorded during that interval). Every wait is raced against a
//! cancellation token, so a cancelled run returns within one interval.

use std::time::{Duration, Instant};

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::constants::{BENCHMARK_MARGINAL_RATIO, BENCHMARK_POLL_INTERVAL, BENCHMARK_WARMUP};
use super::error::BenchmarkError;
use crate::sampler::{FrameRateSampler, PerformanceIssues};

/// Outcome classification relative to the target frame rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BenchmarkVerdict {
    /// Average at or above target.
    Sustained,
    /// Average at or above 65% of target.
    Marginal,
    /// Anything lower.
    Degraded,
}

impl BenchmarkVerdict {
    pub fn classify(average_fps: f32, target_fps: u32) -> Self {
        let target = target_fps as f32;
        if average_fps >= target {
            Self::Sustained
        } else if average_fps >= target * BENCHMARK_MARGINAL_RATIO {
            Self::Marginal
        } else {
            Self::Degraded
        }
    }
}

impl std::fmt::Display for BenchmarkVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Sustained => "sustained",
            Self::Marginal => "marginal",
            Self::Degraded => "degraded",
        };
        f.write_str(s)
    }
}

/// Result of a completed benchmark.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    pub target_fps: u32,
    pub duration_secs: f64,
    /// One averaged reading per polling interval.
    pub readings: Vec<f32>,
    pub average_fps: f32,
    pub min_fps: f32,
    pub max_fps: f32,
    pub sample_count: usize,
    pub issues: PerformanceIssues,
    pub verdict: BenchmarkVerdict,
}

/// Benchmark runner.
#[derive(Debug, Clone)]
pub struct PerformanceBenchmark {
    duration: Duration,
    target_fps: u32,
    warmup: Duration,
    poll_interval: Duration,
}

impl PerformanceBenchmark {
    pub fn new(duration: Duration, target_fps: u32) -> Self {
        Self {
            duration,
            target_fps,
            warmup: BENCHMARK_WARMUP,
            poll_interval: BENCHMARK_POLL_INTERVAL,
        }
    }

    /// Override warm-up and polling interval.
    pub fn with_timing(mut self, warmup: Duration, poll_interval: Duration) -> Self {
        self.warmup = warmup;
        self.poll_interval = poll_interval;
        self
    }

    /// Number of readings a full run takes.
    pub fn polls(&self) -> u32 {
        let interval = self.poll_interval.as_nanos().max(1);
        (self.duration.as_nanos() / interval).min(u32::MAX as u128) as u32
    }

    /// Run against `sampler` until done or cancelled.
    pub async fn run(
        &self,
        sampler: &FrameRateSampler,
        cancel: &CancellationToken,
    ) -> Result<BenchmarkReport, BenchmarkError> {
        let polls = self.polls();
        if polls == 0 {
            return Err(BenchmarkError::TooShort(self.duration));
        }

        info!(
            duration_secs = self.duration.as_secs_f64(),
            target_fps = self.target_fps,
            "Benchmark started"
        );

        wait(self.warmup, cancel).await?;

        let mut readings = Vec::with_capacity(polls as usize);
        let mut window_start = Instant::now();
        for poll in 0..polls {
            wait(self.poll_interval, cancel).await?;
            let now = Instant::now();
            match sampler.average_since(window_start) {
                Some(avg) => {
                    debug!(poll, fps = avg, "Benchmark reading");
                    readings.push(avg);
                }
                None => debug!(poll, "Benchmark interval had no frames"),
            }
            window_start = now;
        }

        if readings.is_empty() {
            return Err(BenchmarkError::NoSamples);
        }

        let average_fps = readings.iter().sum::<f32>() / readings.len() as f32;
        let min_fps = readings.iter().copied().fold(f32::INFINITY, f32::min);
        let max_fps = readings.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let verdict = BenchmarkVerdict::classify(average_fps, self.target_fps);

        info!(
            average_fps,
            min_fps,
            max_fps,
            readings = readings.len(),
            %verdict,
            "Benchmark finished"
        );

        Ok(BenchmarkReport {
            target_fps: self.target_fps,
            duration_secs: self.duration.as_secs_f64(),
            sample_count: readings.len(),
            readings,
            average_fps,
            min_fps,
            max_fps,
            issues: sampler.detect_issues(),
            verdict,
        })
    }
}

async fn wait(duration: Duration, cancel: &CancellationToken) -> Result<(), BenchmarkError> {
    tokio::select! {
        biased;

        _ = cancel.cancelled() => {
            debug!("Benchmark cancelled");
            Err(BenchmarkError::Cancelled)
        }
        _ = tokio::time::sleep(duration) => Ok(()),
    }
}
