//! Client-local persistence, the localStorage seam.
//!
//! The browser app kept its whole collection as one string under one
//! key. This keeps that contract with the DOM removed: string keys to
//! string values, synchronous, last write wins. `DirStore` is the
//! on-disk implementation (one file per key); `MemoryStore` backs
//! tests and throwaway embedding.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::store::StoreError;

/// Key the client collection persists under.
pub const TASKS_KEY: &str = "todoTasks";

pub trait LocalStore {
    /// Fetch a value. A key that was never written is `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;
}

// ── Directory-backed store ───────────────────────────────────────────

/// One file per key under a root directory: `<root>/<key>.json`.
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    /// Use `root` for storage, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| StoreError::Storage(format!("create {}: {e}", root.display())))?;
        Ok(DirStore { root })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}

impl LocalStore for DirStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Storage(format!("read {key}: {e}"))),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        fs::write(self.path_for(key), value)
            .map_err(|e| StoreError::Storage(format!("write {key}: {e}")))
    }
}

// ── In-memory store ──────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl LocalStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
