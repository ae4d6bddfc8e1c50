use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use log::debug;

use crate::{error::Result, storage::engine::Engine};

/// Filesystem storage engine: keys map to paths below a root directory.
pub struct DiskEngine {
    root: PathBuf,
}

impl DiskEngine {
    /// Opens a disk engine, creating the root directory if needed
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        debug!("opened storage root {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Removes every database under the root, keeping the root itself
    pub fn clean(&mut self) -> Result<()> {
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn path(&self, key: &str) -> PathBuf {
        key.split('/').fold(self.root.clone(), |path, part| path.join(part))
    }
}

impl Engine for DiskEngine {
    fn set(&mut self, key: &str, value: Vec<u8>) -> Result<()> {
        fs::write(self.path(key), value)?;
        Ok(())
    }

    fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>> {
        match fs::read(self.path(key)) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn delete(&mut self, key: &str) -> Result<()> {
        fs::remove_file(self.path(key))?;
        Ok(())
    }

    fn exists(&mut self, key: &str) -> Result<bool> {
        Ok(self.path(key).try_exists()?)
    }

    fn create_dir(&mut self, key: &str) -> Result<()> {
        fs::create_dir(self.path(key))?;
        Ok(())
    }

    fn delete_dir(&mut self, key: &str) -> Result<()> {
        fs::remove_dir_all(self.path(key))?;
        Ok(())
    }
}
