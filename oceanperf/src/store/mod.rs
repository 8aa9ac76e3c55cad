//! Persistent key-value storage for controller state.
//!
//! The controller only sees [`PreferenceStore`]; backends decide where the
//! bytes live. [`StateStore`] adds typed access on top.

mod error;
mod ini_file;
mod memory;
mod state;

pub use error::{StoreError, StoreResult};
pub use ini_file::{default_state_path, IniPreferenceStore, STATE_FILE_NAME, STATE_SECTION};
pub use memory::MemoryPreferenceStore;
pub use state::{PersistedState, StateStore};

/// Persisted key names.
pub mod keys {
    pub const CURRENT_TIER: &str = "current_tier";
    pub const USER_OVERRIDE_TIER: &str = "user_override_tier";
    pub const LAST_DETECTION_TIME: &str = "last_detection_time";
    pub const TOTAL_RUNTIME_SECONDS: &str = "total_runtime_seconds";
    pub const AVERAGE_FPS: &str = "average_fps";
    pub const PERFORMANCE_HISTORY: &str = "performance_history";
    pub const AUTO_ADJUST_ENABLED: &str = "auto_adjust_enabled";

    pub const ALL: [&str; 7] = [
        CURRENT_TIER,
        USER_OVERRIDE_TIER,
        LAST_DETECTION_TIME,
        TOTAL_RUNTIME_SECONDS,
        AVERAGE_FPS,
        PERFORMANCE_HISTORY,
        AUTO_ADJUST_ENABLED,
    ];
}

/// String key-value store.
///
/// Implementations must be safe to call from the monitor task and from
/// user-facing calls at the same time.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    fn remove(&self, key: &str) -> StoreResult<()>;

    /// Write several keys. Backends that flush per write should override this.
    fn set_many(&self, entries: &[(&str, String)]) -> StoreResult<()> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}
