// ── File-Backed Store ──
//
// One file per key under a root directory:
//   <root>/
//     selflens_agreed
//     selflens_profile
//     selflens_incidents
//     ...
// Writes go to a sibling temp file first and are renamed into place, so a
// record is either the old value or the new one.

use std::fs;
use std::io::{Error, ErrorKind};
use std::path::{Path, PathBuf};

use selflens_core::{Result, SelfLensError};

use crate::{corrupt_key, KeyValueStore};

const TEMP_SUFFIX: &str = ".tmp";

/// Handle to a store directory on disk.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
}

// ── Helpers ──

/// Keys become file names, so only plain names are accepted.
fn validate_key(key: &str) -> Result<()> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SelfLensError::Io(Error::new(
            ErrorKind::InvalidInput,
            format!("invalid store key: {:?}", key),
        )))
    }
}

// ── Public API ──

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Open a store, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let store = Self::new(root);
        fs::create_dir_all(&store.root)?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        validate_key(key)?;
        Ok(self.root.join(key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        match String::from_utf8(bytes) {
            Ok(value) => Ok(Some(value)),
            Err(_) => {
                // The next write would replace the only copy of these bytes.
                let copy = self.root.join(corrupt_key(key));
                fs::copy(&path, &copy)?;
                log::warn!(
                    "{} is not valid UTF-8, copied to {}",
                    path.display(),
                    copy.display()
                );
                Err(SelfLensError::Undecodable {
                    key: key.to_string(),
                })
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key)?;
        fs::create_dir_all(&self.root)?;

        let temp = self.root.join(format!("{}{}", key, TEMP_SUFFIX));
        fs::write(&temp, value)?;
        fs::rename(&temp, &path)?;
        log::debug!("wrote {} ({} bytes)", path.display(), value.len());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ── Tests ──
