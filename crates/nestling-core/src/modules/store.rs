//! Key/value persistence for credential selection, quota windows and the
//! device identity.
//!
//! Production builds back [`SecureStore`] with the platform keystore, which
//! provides at-rest encryption. [`FileStore`] is the desktop/CLI stand-in and
//! [`MemoryStore`] serves tests and ephemeral sessions.

use dashmap::DashMap;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{AppError, AppResult};

const STORE_FILE: &str = "secure_store.json";

pub trait SecureStore: Send + Sync {
    fn get(&self, key: &str) -> AppResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> AppResult<()>;
    fn delete(&self, key: &str) -> AppResult<()>;
}

/// Typed read. A value that no longer parses is reported as an error so the
/// caller can decide whether to start fresh.
pub fn get_json<T: DeserializeOwned>(store: &dyn SecureStore, key: &str) -> AppResult<Option<T>> {
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn set_json<T: Serialize>(store: &dyn SecureStore, key: &str, value: &T) -> AppResult<()> {
    let raw = serde_json::to_string(value)?;
    store.set(key, &raw)
}

/// In-memory store. Can be switched to "unavailable" to simulate a locked or
/// broken keystore.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: DashMap<String, String>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::SeqCst);
    }

    fn check(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::Store("store unavailable".to_string()));
        }
        Ok(())
    }
}

impl SecureStore for MemoryStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        self.check()?;
        Ok(self.values.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.check()?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> AppResult<()> {
        self.check()?;
        self.values.remove(key);
        Ok(())
    }
}

/// JSON file store with atomic writes (temp file + rename).
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens (or creates) the store inside `data_dir`.
    pub fn open(data_dir: &Path) -> AppResult<Self> {
        fs::create_dir_all(data_dir)?;
        let path = data_dir.join(STORE_FILE);

        let values = if path.exists() {
            let content = fs::read_to_string(&path)?;
            match serde_json::from_str(&content) {
                Ok(values) => values,
                Err(e) => {
                    tracing::warn!("Secure store {:?} is corrupt ({}), starting empty", path, e);
                    BTreeMap::new()
                },
            }
        } else {
            BTreeMap::new()
        };

        Ok(Self { path, values: Mutex::new(values) })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> AppResult<()> {
        let temp_path = self.path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(values)?;
        fs::write(&temp_path, content)?;
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }
}

impl SecureStore for FileStore {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.values.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        let mut values = self.values.lock();
        values.insert(key.to_string(), value.to_string());
        self.flush(&values)
    }

    fn delete(&self, key: &str) -> AppResult<()> {
        let mut values = self.values.lock();
        if values.remove(key).is_some() {
            self.flush(&values)?;
        }
        Ok(())
    }
}
