// ── Key-Value Storage ──
//
// The journal keeps five records under fixed keys. Anything that can get,
// set and remove a string by key can back a journal.

pub mod config;
pub mod file;

use std::collections::HashMap;

use selflens_core::Result;

pub use config::{load_config, Config, ServerConfig};
pub use file::FileStore;

// ── Constants ──

pub const AGREED_KEY: &str = "selflens_agreed";
pub const PROFILE_KEY: &str = "selflens_profile";
pub const INCIDENTS_KEY: &str = "selflens_incidents";
pub const THEME_KEY: &str = "selflens_theme";
pub const ACCESS_CODE_KEY: &str = "selflens_password";

pub const ALL_KEYS: [&str; 5] = [
    AGREED_KEY,
    PROFILE_KEY,
    INCIDENTS_KEY,
    THEME_KEY,
    ACCESS_CODE_KEY,
];

const CORRUPT_SUFFIX: &str = "_corrupt";

/// Side key holding a copy of a damaged record.
pub fn corrupt_key(key: &str) -> String {
    format!("{}{}", key, CORRUPT_SUFFIX)
}

// ── Types ──

pub trait KeyValueStore {
    /// Read a value. Missing keys are `Ok(None)`.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// Process-local store, lost when dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

// ── Public API ──

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}

// ── Tests ──
