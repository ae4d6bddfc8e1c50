use std::collections::{BTreeMap, BTreeSet};

use crate::{
    error::{Error, Result},
    storage::engine::Engine,
};

/// In-memory storage engine
///
/// Mirrors the directory/file layout of the disk engine so the table layer
/// behaves the same on both.
pub struct MemoryEngine {
    dirs: BTreeSet<String>,
    files: BTreeMap<String, Vec<u8>>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            dirs: BTreeSet::new(),
            files: BTreeMap::new(),
        }
    }

    /// Fails unless the key's parent directory exists
    fn check_parent(&self, key: &str) -> Result<()> {
        match key.rsplit_once('/') {
            Some((parent, _)) if !self.dirs.contains(parent) => Err(Error::Internal(format!(
                "directory {} not found",
                parent
            ))),
            _ => Ok(()),
        }
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Implements storage Engine trait (path-level operations)
impl Engine for MemoryEngine {
    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        self.check_parent(key)?;
        self.files.insert(key.to_string(), value);
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.files.get(key).cloned())
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        self.check_parent(key)?;
        self.files
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| Error::Internal(format!("file {} not found", key)))
    }

    fn exists(&mut self, key: &str) -> Result<bool> {
        Ok(self.dirs.contains(key) || self.files.contains_key(key))
    }

    fn create_dir(&mut self, key: &str) -> Result<()> {
        self.check_parent(key)?;
        if !self.dirs.insert(key.to_string()) {
            return Err(Error::Internal(format!("directory {} already exists", key)));
        }
        Ok(())
    }

    fn delete_dir(&mut self, key: &str) -> Result<()> {
        if !self.dirs.remove(key) {
            return Err(Error::Internal(format!("directory {} not found", key)));
        }
        let prefix = format!("{}/", key);
        self.dirs.retain(|d| !d.starts_with(&prefix));
        self.files.retain(|f, _| !f.starts_with(&prefix));
        Ok(())
    }
}
