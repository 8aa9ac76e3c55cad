//! Persisted controller state commands.

use std::path::Path;
use std::sync::Arc;

use clap::Subcommand;
use oceanperf::store::{IniPreferenceStore, PersistedState, StateStore, StoreError};
use tracing::warn;

use crate::error::CliError;
use crate::runner::CliRunner;

/// State subcommands.
#[derive(Debug, Subcommand)]
pub enum StateAction {
    /// Show the persisted controller state
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the state file path
    Path,
    /// Delete every persisted value so the next start redetects
    Reset,
}

/// Run a state subcommand.
pub fn run(runner: &CliRunner, action: StateAction) -> Result<(), CliError> {
    match action {
        StateAction::Show { json } => {
            let snapshot = runner.open_state()?.snapshot();
            if json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_snapshot(&snapshot);
            }
            Ok(())
        }
        StateAction::Path => {
            println!("{}", runner.state_path()?.display());
            Ok(())
        }
        StateAction::Reset => {
            reset_state_file(&runner.state_path()?)?;
            println!("Persisted performance state cleared.");
            Ok(())
        }
    }
}

/// Clear every persisted key; a state file that no longer parses is removed.
fn reset_state_file(path: &Path) -> Result<(), CliError> {
    match IniPreferenceStore::open(path) {
        Ok(store) => Ok(StateStore::new(Arc::new(store)).reset()?),
        Err(StoreError::Parse { message, .. }) => {
            warn!(path = %path.display(), error = %message, "Removing unparsable state file");
            std::fs::remove_file(path).map_err(|source| {
                CliError::Store(StoreError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            })
        }
        Err(e) => Err(e.into()),
    }
}

fn print_snapshot(state: &PersistedState) {
    let rows = [
        ("current_tier", &state.current_tier),
        ("user_override_tier", &state.user_override_tier),
        ("last_detection_time", &state.last_detection_time),
        ("total_runtime_seconds", &state.total_runtime_seconds),
        ("average_fps", &state.average_fps),
        ("auto_adjust_enabled", &state.auto_adjust_enabled),
        ("performance_history", &state.performance_history),
    ];

    println!("[performance]");
    for (key, value) in rows {
        match value {
            Some(value) => println!("  {} = {}", key, value),
            None => println!("  {} = (not set)", key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oceanperf::store::{keys, PreferenceStore};
    use tempfile::TempDir;

    #[test]
    fn test_reset_clears_keys() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("performance_state.ini");
        let store = IniPreferenceStore::open(&path).unwrap();
        store.set(keys::CURRENT_TIER, "HIGH").unwrap();
        drop(store);

        reset_state_file(&path).unwrap();
        let store = IniPreferenceStore::open(&path).unwrap();
        assert_eq!(store.get(keys::CURRENT_TIER).unwrap(), None);
    }

    #[test]
    fn test_reset_removes_unparsable_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("performance_state.ini");
        std::fs::write(&path, "[performance\n").unwrap();

        reset_state_file(&path).unwrap();
        assert!(!path.exists());
    }
}
