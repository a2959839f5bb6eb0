//! Media Storage
//!
//! Uploaded files are addressed by an opaque relative key such as
//! `images/3q2-7wEAQ9mXr1bL0x1Vtg.jpg`. Keys are generated here; callers
//! only store and render them.

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::crypto::random_token;

/// Random bytes per generated file name
const KEY_TOKEN_BYTES: usize = 16;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// File storage backend
#[trait_variant::make(MediaStore: Send)]
pub trait LocalMediaStore {
    /// Store `bytes` under `directory` and return the generated key
    async fn put(&self, directory: &str, extension: &str, bytes: Vec<u8>)
    -> Result<String, StorageError>;

    /// Remove a stored file. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Build a fresh key, rejecting anything that could escape the media root
fn generate_key(directory: &str, extension: &str) -> Result<String, StorageError> {
    let is_safe = |s: &str| {
        !s.is_empty()
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    };
    if !is_safe(directory) {
        return Err(StorageError::InvalidKey(directory.to_string()));
    }
    if !is_safe(extension) {
        return Err(StorageError::InvalidKey(extension.to_string()));
    }
    Ok(format!(
        "{}/{}.{}",
        directory,
        random_token(KEY_TOKEN_BYTES),
        extension.to_ascii_lowercase()
    ))
}

/// Resolve `key` below `root`, refusing absolute paths and `..`
fn resolve(root: &Path, key: &str) -> Result<PathBuf, StorageError> {
    let relative = Path::new(key);
    let only_normal = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if key.is_empty() || !only_normal {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(root.join(relative))
}

// ============================================================================
// Filesystem backend
// ============================================================================

/// Stores files below a root directory (`MEDIA_ROOT`)
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MediaStore for FsMediaStore {
    async fn put(
        &self,
        directory: &str,
        extension: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let key = generate_key(directory, extension)?;
        let path = resolve(&self.root, &key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &bytes).await?;

        tracing::debug!(key = %key, size = bytes.len(), "Media file stored");
        Ok(key)
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = resolve(&self.root, key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                tracing::debug!(key = %key, "Media file removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

// ============================================================================
// In-memory backend
// ============================================================================

/// Keeps files in memory. Used in tests and local experiments.
#[derive(Debug, Clone, Default)]
pub struct MemoryMediaStore {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>> {
        // A poisoned map is still structurally valid
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl MediaStore for MemoryMediaStore {
    async fn put(
        &self,
        directory: &str,
        extension: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let key = generate_key(directory, extension)?;
        self.lock().insert(key.clone(), bytes);
        Ok(key)
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{FsMediaStore, MediaStore, MemoryMediaStore, generate_key, resolve};
    use std::path::Path;

    #[test]
    fn test_generate_key_shape() {
        let key = generate_key("images", "JPG").unwrap();
        assert!(key.starts_with("images/"));
        assert!(key.ends_with(".jpg"));
        assert_ne!(key, generate_key("images", "jpg").unwrap());
    }

    #[test]
    fn test_generate_key_rejects_traversal() {
        assert!(generate_key("../etc", "jpg").is_err());
        assert!(generate_key("images", "jpg/../x").is_err());
        assert!(generate_key("", "jpg").is_err());
    }

    #[test]
    fn test_resolve_rejects_escaping_keys() {
        let root = Path::new("/srv/media");
        assert!(resolve(root, "images/a.jpg").is_ok());
        assert!(resolve(root, "../secret").is_err());
        assert!(resolve(root, "/etc/passwd").is_err());
        assert!(resolve(root, "").is_err());
    }

    #[tokio::test]
    async fn test_fs_store_put_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsMediaStore::new(dir.path());

        let key = store.put("images", "png", vec![1, 2, 3]).await.unwrap();
        let path = dir.path().join(&key);
        assert_eq!(tokio::fs::read(&path).await.unwrap(), vec![1, 2, 3]);

        store.remove(&key).await.unwrap();
        assert!(!path.exists());

        // Second removal is a no-op
        store.remove(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryMediaStore::new();
        let key = store.put("images", "jpg", vec![9]).await.unwrap();
        assert!(store.contains(&key));
        assert_eq!(store.len(), 1);

        store.remove(&key).await.unwrap();
        assert!(store.is_empty());
    }
}
