//! Background monitoring task.
//!
//! ```text
//!   interval (3s, first tick skipped)
//!        │
//!        ▼
//!   ControllerShared::tick ──► average of last N samples ──► TierEvaluator
//!        │                                                     │
//!        │ panic: logged, loop continues                       ▼
//!        │                                            publish + persist tier
//!   cancelled() ──► exit
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::adaptive::ControllerShared;
use super::error::ControllerError;

/// Handle to a running monitoring task.
#[derive(Debug)]
pub(crate) struct MonitorHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl MonitorHandle {
    /// Spawn the monitoring loop on `runtime`.
    pub(crate) fn spawn(shared: Arc<ControllerShared>, runtime: &Handle) -> Self {
        let token = CancellationToken::new();
        let task = runtime.spawn(run(shared, token.clone()));
        Self { token, task }
    }

    /// Request the loop to stop. Returns without waiting.
    pub(crate) fn stop(&self) {
        self.token.cancel();
    }

    pub(crate) fn is_running(&self) -> bool {
        !self.token.is_cancelled() && !self.task.is_finished()
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run(shared: Arc<ControllerShared>, token: CancellationToken) {
    let period = shared.settings().evaluation_interval;
    info!(interval_ms = period.as_millis() as u64, "Performance monitoring started");

    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = token.cancelled() => break,

            _ = ticker.tick() => {
                let outcome = catch_unwind(AssertUnwindSafe(|| shared.tick(Instant::now())));
                if let Err(payload) = outcome {
                    let err = ControllerError::from_panic(payload);
                    error!(error = %err, "Monitoring tick failed, continuing");
                }
            }
        }
    }

    info!("Performance monitoring stopped");
}
