//! Builder for [`AdaptivePerformanceController`].
//!
//! ```ignore
//! let controller = AdaptivePerformanceController::builder()
//!     .with_settings(config.performance.clone())
//!     .with_store(Arc::new(IniPreferenceStore::open(path)?))
//!     .with_host(Arc::new(SystemHostInfo::new().with_display(1080, 2400)))
//!     .build();
//! ```
//!
//! Every input has a default: settings from the constants, an in-memory
//! store, the real host and the ambient tokio runtime (if any).

use std::sync::Arc;

use tokio::runtime::Handle;

use super::adaptive::AdaptivePerformanceController;
use crate::config::PerformanceSettings;
use crate::device::{DeviceCapabilityProbe, HostInfoSource, SystemHostInfo};
use crate::store::{MemoryPreferenceStore, PreferenceStore, StateStore};

#[derive(Debug, Clone, Default)]
enum RuntimeChoice {
    /// Use the runtime the builder is called from, if any.
    #[default]
    Ambient,
    Explicit(Handle),
    /// Never spawn the monitoring task.
    Disabled,
}

/// Collects controller dependencies.
#[derive(Default)]
pub struct AdaptivePerformanceControllerBuilder {
    settings: Option<PerformanceSettings>,
    store: Option<Arc<dyn PreferenceStore>>,
    host: Option<Arc<dyn HostInfoSource>>,
    runtime: RuntimeChoice,
}

impl AdaptivePerformanceControllerBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(mut self, settings: PerformanceSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn PreferenceStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_host(mut self, host: Arc<dyn HostInfoSource>) -> Self {
        self.host = Some(host);
        self
    }

    /// Spawn the monitoring task on this runtime.
    pub fn with_runtime(mut self, handle: Handle) -> Self {
        self.runtime = RuntimeChoice::Explicit(handle);
        self
    }

    /// Build a controller that never monitors in the background. Ticks can
    /// still be driven with `evaluate_now`.
    pub fn without_runtime(mut self) -> Self {
        self.runtime = RuntimeChoice::Disabled;
        self
    }

    /// Build the controller. Never fails.
    pub fn build(self) -> AdaptivePerformanceController {
        let settings = self.settings.unwrap_or_default();
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryPreferenceStore::new()));
        let host = self
            .host
            .unwrap_or_else(|| Arc::new(SystemHostInfo::new()));
        let runtime = match self.runtime {
            RuntimeChoice::Ambient => Handle::try_current().ok(),
            RuntimeChoice::Explicit(handle) => Some(handle),
            RuntimeChoice::Disabled => None,
        };

        AdaptivePerformanceController::from_parts(
            settings,
            StateStore::new(store),
            DeviceCapabilityProbe::new(host),
            runtime,
        )
    }
}

impl std::fmt::Debug for AdaptivePerformanceControllerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptivePerformanceControllerBuilder")
            .field("settings", &self.settings)
            .field("has_store", &self.store.is_some())
            .field("has_host", &self.host.is_some())
            .field("runtime", &self.runtime)
            .finish()
    }
}
