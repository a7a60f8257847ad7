//! Object storage contract used for landing files, config and run logs.
//!
//! Keys are `/`-separated relative paths (`landing/fpl-api/teams/teams_01012025.json`).
//! Providers know nothing about landing layout; that lives in `crate::landing`.

pub mod local;
pub mod memory;

pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid object key '{0}'")]
    InvalidKey(String),

    #[error("storage I/O error on '{key}': {message}")]
    Io { key: String, message: String },

    #[error("object '{0}' is not valid UTF-8")]
    NotText(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Minimal read/write/list contract over an object store.
pub trait ObjectStore: Send + Sync {
    /// Create or overwrite an object.
    fn put(&self, key: &str, body: &[u8]) -> Result<(), StorageError>;

    fn get(&self, key: &str) -> Result<Vec<u8>, StorageError>;

    /// All keys starting with `prefix`, sorted ascending.
    fn list(&self, prefix: &str) -> Result<Vec<String>, StorageError>;

    /// Copy an object; the destination is overwritten if present.
    fn copy(&self, from: &str, to: &str) -> Result<(), StorageError>;

    fn delete(&self, key: &str) -> Result<(), StorageError>;

    fn get_text(&self, key: &str) -> Result<String, StorageError> {
        String::from_utf8(self.get(key)?).map_err(|_| StorageError::NotText(key.to_string()))
    }
}

/// Reject keys that would escape the store root or are not relative paths.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let bad = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation() {
        assert!(validate_key("landing/fpl-api/teams/teams_01012025.json").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("/etc/passwd").is_err());
        assert!(validate_key("landing/../secrets").is_err());
        assert!(validate_key("landing//teams").is_err());
        assert!(validate_key("landing\\teams").is_err());
    }
}
