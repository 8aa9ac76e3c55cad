//! Frame rate sampling and issue detection.
//!
//! ```text
//! render loop ──record(fps)──► FrameRateSampler ──average_of_last(n)──► controller
//!                               (ring buffer, 200)  detect_issues()
//! ```

mod frame_rate;
mod issues;

pub use frame_rate::{
    is_valid_fps, FrameRateSampler, FrameSample, COMPACT_EVERY, DEFAULT_SAMPLE_CAPACITY,
    EXTREMES_RESET_EVERY, MAX_VALID_FPS,
};
pub use issues::{PerformanceIssues, Severity, ISSUE_WINDOW, MIN_SAMPLES_FOR_VERDICT};
