//! File-backed persistence
//!
//! Each key is stored as `{data_dir}/{key}.json`. Writes go to a temp file
//! that is renamed over the target, and use file locking for concurrent
//! access safety.

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use tracing::debug;

use super::persistence::{PersistError, PersistenceStore};

/// Store for persisted values in a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates a new file store rooted at the given directory
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the file path used for a key
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    /// Keys become file names, so they must stay inside the data directory
    fn checked_path(&self, key: &str) -> Result<PathBuf, PersistError> {
        let valid = !key.is_empty()
            && key != "."
            && key != ".."
            && !key.contains(['/', '\\'])
            && Path::new(key).components().count() == 1;
        if !valid {
            return Err(PersistError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.path_for(key))
    }

    fn read_locked(path: &Path) -> io::Result<Vec<u8>> {
        let mut file = File::open(path)?;

        // Shared lock for reading, released when the file is dropped
        file.lock_shared()?;

        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        Ok(bytes)
    }

    fn write_atomic(&self, key: &str, path: &Path, value: &str) -> Result<(), PersistError> {
        let write_err = |source: io::Error| PersistError::Write {
            key: key.to_string(),
            path: path.to_path_buf(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(write_err)?;

        let temp_path = path.with_extension("json.tmp");

        {
            let file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&temp_path)
                .map_err(write_err)?;

            file.lock_exclusive().map_err(|source| PersistError::Locked {
                key: key.to_string(),
                source,
            })?;

            let mut writer = BufWriter::new(&file);
            writer.write_all(value.as_bytes()).map_err(write_err)?;
            writer.flush().map_err(write_err)?;
        }

        fs::rename(&temp_path, path).map_err(write_err)
    }
}

impl PersistenceStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        let path = self.checked_path(key)?;
        if !path.exists() {
            debug!(key, path = %path.display(), "no persisted value");
            return Ok(None);
        }

        let bytes = Self::read_locked(&path).map_err(|source| PersistError::Read {
            key: key.to_string(),
            path: path.clone(),
            source,
        })?;
        let content = String::from_utf8(bytes).map_err(|_| PersistError::Corrupt {
            key: key.to_string(),
            path: path.clone(),
        })?;

        debug!(key, bytes = content.len(), "read persisted value");
        Ok(Some(content))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), PersistError> {
        let path = self.checked_path(key)?;
        self.write_atomic(key, &path, value)?;
        debug!(key, bytes = value.len(), path = %path.display(), "wrote persisted value");
        Ok(())
    }
}
