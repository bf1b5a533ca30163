use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use common::stable_id;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::StoreError;

/// Byte persistence boundary. `put` stores the bytes under the given key
/// and returns the public URL the file is reachable at.
pub trait ObjectStore: Send + Sync {
    /// Id for a new upload. Backends may derive it from the file itself
    /// to keep repeat uploads of the same file from piling up.
    fn allocate_id(&self, file_name: &str, file_size: u64) -> String;

    fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StoreError>;

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    fn delete(&self, key: &str) -> Result<bool, StoreError>;
}

/// Stores objects as plain files under a media root.
pub struct FsObjectStore {
    root: PathBuf,
    public_base: String,
}

impl FsObjectStore {
    pub fn new(root: PathBuf, public_base: &str) -> Self {
        Self {
            root,
            public_base: normalize_base(public_base),
        }
    }

    fn path_for(&self, key: &str) -> Option<PathBuf> {
        let mut out = self.root.clone();
        for part in key.split('/') {
            if part.is_empty() || part == "." || part == ".." {
                return None;
            }
            out.push(part);
        }
        Some(out)
    }
}

impl ObjectStore for FsObjectStore {
    fn allocate_id(&self, _file_name: &str, _file_size: u64) -> String {
        Uuid::new_v4().to_string()
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StoreError> {
        let path = self
            .path_for(key)
            .ok_or_else(|| bad_key_error(key))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, bytes)?;
        Ok(public_url(&self.public_base, key))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let path = match self.path_for(key) {
            Some(path) => path,
            None => return Ok(None),
        };
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let path = match self.path_for(key) {
            Some(path) => path,
            None => return Ok(false),
        };
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

/// In-memory fake for tests and for running without any media directory.
/// Ids are derived from the file name and size, so re-uploading the same
/// file reuses the same id instead of creating a duplicate record.
#[derive(Clone)]
pub struct MemoryObjectStore {
    inner: Arc<RwLock<HashMap<String, Vec<u8>>>>,
    public_base: String,
}

impl MemoryObjectStore {
    pub fn new(public_base: &str) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            public_base: normalize_base(public_base),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl ObjectStore for MemoryObjectStore {
    fn allocate_id(&self, file_name: &str, file_size: u64) -> String {
        stable_id(&format!("{}:{}", file_name, file_size))
    }

    fn put(&self, key: &str, bytes: &[u8]) -> Result<String, StoreError> {
        self.inner.write().insert(key.to_string(), bytes.to_vec());
        Ok(public_url(&self.public_base, key))
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.inner.read().get(key).cloned())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().remove(key).is_some())
    }
}

fn normalize_base(base: &str) -> String {
    let trimmed = base.trim_end_matches('/');
    if trimmed.is_empty() {
        "/media".to_string()
    } else {
        trimmed.to_string()
    }
}

fn public_url(base: &str, key: &str) -> String {
    format!("{}/{}", base, key)
}

fn bad_key_error(key: &str) -> StoreError {
    StoreError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        format!("invalid object key: {}", key),
    ))
}

#[cfg(test)]
mod tests {
    use super::{FsObjectStore, MemoryObjectStore, ObjectStore};

    #[test]
    fn memory_roundtrip_and_delete() {
        let store = MemoryObjectStore::new("/media");
        let url = store.put("u/1-a.mp3", b"abc").unwrap();
        assert_eq!(url, "/media/u/1-a.mp3");
        assert_eq!(store.get("u/1-a.mp3").unwrap().unwrap(), b"abc");
        assert!(store.delete("u/1-a.mp3").unwrap());
        assert!(!store.delete("u/1-a.mp3").unwrap());
        assert!(store.get("u/1-a.mp3").unwrap().is_none());
    }

    #[test]
    fn memory_ids_are_stable_per_file() {
        let store = MemoryObjectStore::new("/media");
        let first = store.allocate_id("track.mp3", 100);
        let second = store.allocate_id("track.mp3", 100);
        assert_eq!(first, second);
        assert_ne!(first, store.allocate_id("track.mp3", 101));
    }

    #[test]
    fn fs_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path().to_path_buf(), "/media/");
        let url = store.put("u/1-a.mp3", b"xyz").unwrap();
        assert_eq!(url, "/media/u/1-a.mp3");
        assert_eq!(store.get("u/1-a.mp3").unwrap().unwrap(), b"xyz");
        assert!(store.get("u/absent").unwrap().is_none());
        assert!(store.delete("u/1-a.mp3").unwrap());
        assert!(!store.delete("u/1-a.mp3").unwrap());
    }

    #[test]
    fn fs_rejects_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path().to_path_buf(), "/media");
        assert!(store.put("../escape", b"x").is_err());
        assert!(store.get("../escape").unwrap().is_none());
    }

    #[test]
    fn fs_ids_are_unique() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path().to_path_buf(), "/media");
        assert_ne!(
            store.allocate_id("a.mp3", 1),
            store.allocate_id("a.mp3", 1)
        );
    }
}
