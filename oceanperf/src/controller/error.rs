//! Controller and benchmark errors.

use thiserror::Error;

use crate::store::StoreError;

/// Failures inside the controller.
///
/// None of these reach callers of the public API: initialization failures
/// select the emergency profile and tick failures are logged.
#[derive(Debug, Error)]
pub enum ControllerError {
    /// Persisted state could not be restored.
    #[error("failed to restore persisted state: {0}")]
    Restore(#[from] StoreError),

    /// An evaluation tick panicked.
    #[error("evaluation tick panicked: {0}")]
    TickPanicked(String),
}

/// Benchmark failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BenchmarkError {
    /// The cancellation token fired before the run finished.
    #[error("benchmark cancelled")]
    Cancelled,

    /// No frame rate was recorded during the measured window.
    #[error("no frames recorded during the benchmark")]
    NoSamples,

    /// Duration shorter than one polling interval.
    #[error("benchmark duration too short: {0:?}")]
    TooShort(std::time::Duration),
}

impl ControllerError {
    /// Build from a caught panic payload.
    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Self::TickPanicked(message)
    }
}
