//! Persistence and video storage seams
//!
//! [`KeyValueStore`] holds small string values such as the boot configuration.
//! [`VideoStorage`] is the destination recordings are written to and answers
//! free-space queries before a recording starts.

use crate::errors::{CameraError, HardwareError};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

pub trait KeyValueStore: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), CameraError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Option<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), CameraError> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Key/value store persisted as a single JSON object on disk
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<HashMap<String, String>, CameraError> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get_item(&self, key: &str) -> Option<String> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.read_all() {
            Ok(mut items) => items.remove(key),
            Err(e) => {
                log::warn!("Failed to read store {:?}: {}", self.path, e);
                None
            }
        }
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), CameraError> {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut items = self.read_all().unwrap_or_else(|e| {
            log::warn!("Discarding unreadable store {:?}: {}", self.path, e);
            HashMap::new()
        });
        items.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&items)?)?;
        Ok(())
    }
}

#[async_trait]
pub trait VideoStorage: Send + Sync {
    /// Name of the storage area, e.g. `videos`
    fn name(&self) -> &str;

    /// Bytes still available for new recordings
    async fn free_space(&self) -> Result<u64, HardwareError>;
}

/// Directory-backed video storage limited by a byte quota.
///
/// Free space is the quota minus the bytes already stored below `root`.
#[derive(Debug, Clone)]
pub struct QuotaDirectoryStorage {
    name: String,
    root: PathBuf,
    quota_bytes: u64,
}

impl QuotaDirectoryStorage {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>, quota_bytes: u64) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            quota_bytes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn used_bytes(&self) -> std::io::Result<u64> {
        let mut total = 0u64;
        let mut pending = vec![self.root.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            };
            while let Some(entry) = entries.next_entry().await? {
                let metadata = entry.metadata().await?;
                if metadata.is_dir() {
                    pending.push(entry.path());
                } else {
                    total = total.saturating_add(metadata.len());
                }
            }
        }
        Ok(total)
    }
}

#[async_trait]
impl VideoStorage for QuotaDirectoryStorage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn free_space(&self) -> Result<u64, HardwareError> {
        let used = self
            .used_bytes()
            .await
            .map_err(|e| HardwareError::new(format!("failed to scan {:?}: {}", self.root, e)))?;
        Ok(self.quota_bytes.saturating_sub(used))
    }
}
