//! Preference store errors.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from a preference store backend or from decoding stored values.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The backing file exists but is not valid INI.
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    /// A stored value could not be decoded.
    #[error("corrupt value for '{key}': {value:?}")]
    Corrupt { key: &'static str, value: String },

    /// The backend refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_corrupt_display() {
        let err = StoreError::Corrupt {
            key: "current_tier",
            value: "SUPER".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("current_tier"));
        assert!(msg.contains("SUPER"));
    }
}
