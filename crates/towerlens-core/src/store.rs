//! Blob store access
//!
//! The bucket is a flat key space of `/`-separated names. [`DirectoryStore`]
//! maps it onto a local directory tree; [`MemoryStore`] keeps it in a map.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::RwLock;

use thiserror::Error;
use tracing::debug;

/// Blob store failure
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid file name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// List/get/put access to a bucket of objects
pub trait BlobStore: Send + Sync {
    /// Keys starting with `prefix`, sorted
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;

    /// Create or overwrite an object
    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError>;
}

/// Every `.xlsx` key in the store, sorted
pub fn list_xlsx(store: &dyn BlobStore) -> Result<Vec<String>, StoreError> {
    let mut keys: Vec<String> = store
        .list("")?
        .into_iter()
        .filter(|k| k.to_ascii_lowercase().ends_with(".xlsx"))
        .collect();
    keys.sort();
    debug!(count = keys.len(), "listed xlsx objects");
    Ok(keys)
}

// ============================================================================
// Directory Store
// ============================================================================

/// A local directory used as the bucket
#[derive(Clone, Debug)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path for a key; rejects absolute keys and parent traversal
    fn path_for(&self, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(key);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if key.is_empty() || !plain {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(relative))
    }

    fn walk(&self, dir: &Path, keys: &mut Vec<String>) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            key: dir.display().to_string(),
            source,
        };
        for entry in fs::read_dir(dir).map_err(io_err)? {
            let entry = entry.map_err(io_err)?;
            let path = entry.path();
            if entry.file_type().map_err(io_err)?.is_dir() {
                self.walk(&path, keys)?;
            } else if let Ok(relative) = path.strip_prefix(&self.root) {
                let key: Vec<String> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                keys.push(key.join("/"));
            }
        }
        Ok(())
    }
}

impl BlobStore for DirectoryStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        if !self.root.is_dir() {
            return Err(StoreError::Unavailable(format!(
                "{} is not a directory",
                self.root.display()
            )));
        }
        let mut keys = Vec::new();
        self.walk(&self.root, &mut keys)?;
        keys.retain(|k| k.starts_with(prefix));
        keys.sort();
        Ok(keys)
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.path_for(key)?;
        if !path.is_file() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        fs::read(&path).map_err(|source| StoreError::Io {
            key: key.to_string(),
            source,
        })
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let path = self.path_for(key)?;
        let io_err = |source| StoreError::Io {
            key: key.to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::write(&path, bytes).map_err(io_err)?;
        debug!(key, bytes = bytes.len(), "stored object");
        Ok(())
    }
}

// ============================================================================
// Memory Store
// ============================================================================

/// In-memory bucket
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_object(self, key: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        if let Ok(mut objects) = self.objects.write() {
            objects.insert(key.into(), bytes.into());
        }
        self
    }
}

fn poisoned() -> StoreError {
    StoreError::Unavailable("memory store lock poisoned".into())
}

impl BlobStore for MemoryStore {
    fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        Ok(objects
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let objects = self.objects.read().map_err(|_| poisoned())?;
        objects
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<(), StoreError> {
        if key.is_empty() {
            return Err(StoreError::InvalidKey(String::new()));
        }
        let mut objects = self.objects.write().map_err(|_| poisoned())?;
        objects.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
