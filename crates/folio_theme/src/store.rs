//! Preference persistence
//!
//! A flat string-to-string table. [`MemoryStore`] backs tests and hosts
//! without storage; [`TomlFileStore`] keeps one TOML table on disk and
//! rewrites it on every change.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use indexmap::IndexMap;

use crate::error::{PreferenceError, Result};

/// Key under which the theme preference is stored
pub const THEME_KEY: &str = "theme";

/// Key under which the language preference is stored
pub const LANGUAGE_KEY: &str = "language";

/// Somewhere to keep user preferences between sessions
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Preferences held in memory only
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<IndexMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(self, key: &str, value: &str) -> Self {
        if let Ok(mut values) = self.values.lock() {
            values.insert(key.to_string(), value.to_string());
        }
        self
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().map_err(|_| PreferenceError::Poisoned)?;
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| PreferenceError::Poisoned)?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().map_err(|_| PreferenceError::Poisoned)?;
        values.shift_remove(key);
        Ok(())
    }
}

/// Preferences in a TOML file
///
/// A missing file reads as empty and is created on the first write.
#[derive(Debug)]
pub struct TomlFileStore {
    path: PathBuf,
    // Serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl TomlFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<BTreeMap<String, String>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(source) => {
                return Err(PreferenceError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        toml::from_str(&content).map_err(|source| PreferenceError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn write(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let content = toml::to_string_pretty(values)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| PreferenceError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&self.path, content).map_err(|source| PreferenceError::Io {
            path: self.path.clone(),
            source,
        })
    }
}

impl PreferenceStore for TomlFileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| PreferenceError::Poisoned)?;
        Ok(self.read()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| PreferenceError::Poisoned)?;
        let mut values = self.read()?;
        values.insert(key.to_string(), value.to_string());
        self.write(&values)?;
        tracing::debug!("TomlFileStore: saved `{}` to {}", key, self.path.display());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| PreferenceError::Poisoned)?;
        let mut values = self.read()?;
        if values.remove(key).is_some() {
            self.write(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new().with_value(THEME_KEY, "dark");
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("dark"));
        store.set(THEME_KEY, "light").unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap().as_deref(), Some("light"));
        store.remove(THEME_KEY).unwrap();
        assert_eq!(store.get(THEME_KEY).unwrap(), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("folio.toml");
        let store = TomlFileStore::new(&path);

        assert_eq!(store.get(LANGUAGE_KEY).unwrap(), None);
        store.set(LANGUAGE_KEY, "fr").unwrap();
        store.set(THEME_KEY, "system").unwrap();

        let reopened = TomlFileStore::new(&path);
        assert_eq!(reopened.get(LANGUAGE_KEY).unwrap().as_deref(), Some("fr"));
        assert_eq!(reopened.get(THEME_KEY).unwrap().as_deref(), Some("system"));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("language = \"fr\""));
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        fs::write(&path, "theme = [").unwrap();

        let store = TomlFileStore::new(&path);
        assert!(matches!(store.get(THEME_KEY), Err(PreferenceError::Parse { .. })));
    }
}
