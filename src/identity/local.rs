//! Device-scoped key-value persistence, the native counterpart of browser
//! local storage.

use anyhow::{Context, Result};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

pub trait LocalStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Key names used for visitor bookkeeping
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub visitor_id: String,
    pub first_visit: String,
    pub last_visit: String,
    pub visit_count: String,
}

impl StorageKeys {
    pub fn new(prefix: &str) -> Self {
        Self {
            visitor_id: format!("{prefix}_visitor_id"),
            first_visit: format!("{prefix}_first_visit"),
            last_visit: format!("{prefix}_last_visit"),
            visit_count: format!("{prefix}_visit_count"),
        }
    }

    pub fn all(&self) -> [&str; 4] {
        [
            &self.visitor_id,
            &self.first_visit,
            &self.last_visit,
            &self.visit_count,
        ]
    }
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self::new("conversy")
    }
}

#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    entries: DashMap<String, String>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// JSON file backed store, rewritten on every mutation
#[derive(Debug)]
pub struct FileLocalStore {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, String>>,
}

impl FileLocalStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = match std::fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw)
                .with_context(|| format!("corrupt local state file {}", path.display()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("failed to read local state {}", path.display()))
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("failed to write local state {}", self.path.display()))?;
        Ok(())
    }

    fn with_entries<T>(&self, f: impl FnOnce(&mut BTreeMap<String, String>) -> T) -> Result<T> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("local state lock poisoned"))?;
        Ok(f(&mut entries))
    }
}

impl LocalStore for FileLocalStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.with_entries(|entries| entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let snapshot = self.with_entries(|entries| {
            entries.insert(key.to_string(), value.to_string());
            entries.clone()
        })?;
        self.persist(&snapshot)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let snapshot = self.with_entries(|entries| {
            entries.remove(key);
            entries.clone()
        })?;
        self.persist(&snapshot)
    }
}
