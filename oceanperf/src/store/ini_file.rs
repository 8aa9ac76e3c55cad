//! INI-file preference store.
//!
//! All keys live in one section of a small INI file. The file is read once
//! when the store opens and rewritten on every change; the controller is the
//! only writer, so last-writer-wins is sufficient.

use std::path::{Path, PathBuf};

use ini::Ini;
use parking_lot::Mutex;

use super::error::{StoreError, StoreResult};
use super::PreferenceStore;

/// Section holding the performance state keys.
pub const STATE_SECTION: &str = "performance";

/// Default state file name inside the data directory.
pub const STATE_FILE_NAME: &str = "performance_state.ini";

/// Default state file path (`~/.oceanperf/performance_state.ini`).
pub fn default_state_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".oceanperf").join(STATE_FILE_NAME))
}

/// Preference store persisted to an INI file.
#[derive(Debug)]
pub struct IniPreferenceStore {
    path: PathBuf,
    document: Mutex<Ini>,
}

impl IniPreferenceStore {
    /// Open the store at `path`.
    ///
    /// A missing file is an empty store; it is created on first write.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let document = if path.exists() {
            Ini::load_from_file(&path).map_err(|e| match e {
                ini::Error::Io(source) => StoreError::Io {
                    path: path.clone(),
                    source,
                },
                ini::Error::Parse(parse) => StoreError::Parse {
                    path: path.clone(),
                    message: parse.to_string(),
                },
            })?
        } else {
            Ini::new()
        };

        Ok(Self {
            path,
            document: Mutex::new(document),
        })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, document: &Ini) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        document
            .write_to_file(&self.path)
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

impl PreferenceStore for IniPreferenceStore {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        Ok(self
            .document
            .lock()
            .get_from(Some(STATE_SECTION), key)
            .map(str::to_string))
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut document = self.document.lock();
        document.set_to(Some(STATE_SECTION), key.to_string(), value.to_string());
        self.flush(&document)
    }

    fn remove(&self, key: &str) -> StoreResult<()> {
        let mut document = self.document.lock();
        if document.delete_from(Some(STATE_SECTION), key).is_some() {
            self.flush(&document)?;
        }
        Ok(())
    }

    fn set_many(&self, entries: &[(&str, String)]) -> StoreResult<()> {
        let mut document = self.document.lock();
        for (key, value) in entries {
            document.set_to(Some(STATE_SECTION), key.to_string(), value.clone());
        }
        self.flush(&document)
    }
}
