//! Key-value persistence contract
//!
//! The item store only needs whole-value reads and overwrites under a single
//! key, so any durable string map can back it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Failed to read '{key}' from {}", path.display())]
    Read {
        key: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write '{key}' to {}", path.display())]
    Write {
        key: String,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid storage key '{key}': must be a non-empty file name")]
    InvalidKey { key: String },

    /// The stored bytes are not text; the value is left as it is
    #[error("Value stored under '{key}' in {} is not valid UTF-8", path.display())]
    Corrupt { key: String, path: PathBuf },

    #[error("Failed to lock storage for '{key}'")]
    Locked {
        key: String,
        #[source]
        source: io::Error,
    },

    #[error("Storage quota exceeded writing '{key}': {needed} bytes needed, {quota} allowed")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },
}

/// Durable string storage addressed by key
///
/// Both operations either fully succeed or return an error; a failed write
/// leaves the previous value in place.
pub trait PersistenceStore {
    /// Returns the value stored under `key`, or `None` if nothing is stored
    fn read(&self, key: &str) -> Result<Option<String>, PersistError>;

    /// Replaces the value stored under `key`
    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistError>;
}

impl<P: PersistenceStore + ?Sized> PersistenceStore for Box<P> {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        (**self).read(key)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        (**self).write(key, value)
    }
}

/// In-memory storage shared between handles
///
/// Clones see the same underlying map, so a test (or a second store
/// instance) can inspect what another instance persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Rc<RefCell<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects writes larger than `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        Self {
            entries: Rc::default(),
            quota: Some(bytes),
        }
    }

    /// Seeds a value directly, bypassing the quota
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.borrow_mut().insert(key.into(), value.into());
    }

    /// Returns a copy of the raw stored value
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }
}

impl PersistenceStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.get(key))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        if let Some(quota) = self.quota {
            if value.len() > quota {
                return Err(PersistError::QuotaExceeded {
                    key: key.to_string(),
                    needed: value.len(),
                    quota,
                });
            }
        }

        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_missing_key() {
        let store = MemoryStore::new();
        assert!(store.read("todo-list").unwrap().is_none());
    }

    #[test]
    fn clones_share_entries() {
        let mut store = MemoryStore::new();
        let other = store.clone();

        store.write("todo-list", "[]").unwrap();
        assert_eq!(other.get("todo-list").as_deref(), Some("[]"));
    }

    #[test]
    fn quota_rejects_large_writes_and_keeps_old_value() {
        let mut store = MemoryStore::with_quota(4);
        store.write("k", "[]").unwrap();

        let err = store.write("k", "[1,2,3]").unwrap_err();
        assert!(matches!(
            err,
            PersistError::QuotaExceeded { needed: 7, quota: 4, .. }
        ));
        assert_eq!(store.get("k").as_deref(), Some("[]"));
    }
}
