use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

pub const AIRPORTS_KEY: &str = "cached_airports";
pub const AIRLINES_KEY: &str = "cached_airlines";
pub const CITIES_KEY: &str = "cached_cities";
pub const COUNTRIES_KEY: &str = "cached_countries";
pub const RECENT_SEARCHES_KEY: &str = "recent_searches";
pub const LAST_UPDATE_KEY: &str = "last_update_time";

/// Key-value blob storage backing the reference cache.
pub trait CacheStore: Send + Sync {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;
    /// Replaces the value for `key` as a whole; readers never observe a
    /// partially written blob.
    fn write(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// One JSON file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Cache under the per-user cache directory.
    pub fn default_location() -> Self {
        Self::new(crate::get_cache_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.json", key))
    }
}

impl CacheStore for FileCache {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Some(bytes))
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create cache dir {}", self.root.display()))?;

        // Unique temp file per write; concurrent writers to one key never
        // share a staging path.
        let path = self.path_for(key);
        let mut tmp = NamedTempFile::new_in(&self.root)
            .with_context(|| format!("Failed to stage {}", path.display()))?;
        tmp.write_all(value)
            .with_context(|| format!("Failed to write {}", tmp.path().display()))?;
        tmp.persist(&path)
            .with_context(|| format!("Failed to replace {}", path.display()))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }
}

/// Process-local store, used by tests and `--no-cache` runs.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCache {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))?;
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &[u8]) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))?;
        entries.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))?;
        entries.remove(key);
        Ok(())
    }
}

/// Typed JSON layer over a [`CacheStore`].
#[derive(Clone)]
pub struct ReferenceCache {
    store: Arc<dyn CacheStore>,
}

impl ReferenceCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Serializes `data` under `key` and stamps the last update time.
    pub fn store<T: Serialize + ?Sized>(&self, key: &str, data: &T) -> Result<()> {
        let encoded = serde_json::to_vec(data).with_context(|| format!("Failed to encode {}", key))?;
        self.store.write(key, &encoded)?;
        let stamp = serde_json::to_vec(&Utc::now())?;
        self.store.write(LAST_UPDATE_KEY, &stamp)
    }

    /// Missing or undecodable entries read as `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let bytes = match self.store.read(key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(e) => {
                log::error!("Failed to read cache entry — key={} error={:#}", key, e);
                return None;
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("Failed to decode cache entry — key={} error={}", key, e);
                None
            }
        }
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.load(LAST_UPDATE_KEY)
    }

    pub fn clear(&self, keys: &[&str]) -> Result<()> {
        for key in keys {
            self.store.remove(key)?;
        }
        self.store.remove(LAST_UPDATE_KEY)
    }
}
