//! Adaptive quality control.
//!
//! [`AdaptivePerformanceController`] selects the starting tier, watches the
//! frame rate in the background and publishes the active
//! [`QualityProfile`](crate::quality::QualityProfile). Decisions are made by
//! the pure [`TierEvaluator`]; [`PerformanceBenchmark`] measures a fixed
//! window on demand.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use oceanperf::controller::AdaptivePerformanceController;
//! use oceanperf::device::{CpuFamily, FixedHostInfo};
//! use oceanperf::quality::Tier;
//! use oceanperf::store::MemoryPreferenceStore;
//!
//! let controller = AdaptivePerformanceController::builder()
//!     .with_store(Arc::new(MemoryPreferenceStore::new()))
//!     .with_host(Arc::new(FixedHostInfo::new(4, 6, 28, (1920, 1080), CpuFamily::X86_64)))
//!     .without_runtime()
//!     .build();
//!
//! assert_eq!(controller.current_tier(), Some(Tier::Low));
//!
//! for _ in 0..10 {
//!     controller.record_frame_performance(4.0);
//! }
//! let decision = controller.evaluate_now().unwrap();
//! assert_eq!(decision.to, Tier::VeryLow);
//! ```

mod adaptive;
mod benchmark;
mod builder;
pub mod constants;
mod error;
mod evaluator;
mod monitor;
mod status;

pub use adaptive::{should_detect, AdaptivePerformanceController};
pub use benchmark::{BenchmarkReport, BenchmarkVerdict, PerformanceBenchmark};
pub use builder::AdaptivePerformanceControllerBuilder;
pub use error::{BenchmarkError, ControllerError};
pub use evaluator::{
    critical_threshold, severe_threshold, DecisionReason, Direction, Thresholds, TierDecision,
    TierEvaluator,
};
pub use status::PerformanceStatus;
