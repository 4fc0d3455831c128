//! A filesystem store.
//!
//! Keys map directly to paths below a base directory, so a container written
//! through this store is interoperable with other Zarr V2 implementations on
//! the same filesystem.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use walkdir::WalkDir;

use crate::storage::{
    ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError,
    WritableStorageTraits,
};

/// A filesystem store.
///
/// Every read and write holds a per-key advisory lock for its whole duration,
/// and writes truncate before writing so a chunk file is always fully
/// replaced. Locks are scoped to one file; nothing is held across a
/// read-then-write sequence, so check-then-act races surface as an ordinary
/// missing or present key.
#[derive(Debug)]
pub struct FilesystemStore {
    base_directory: PathBuf,
    readonly: bool,
    files: RwLock<HashMap<String, Mutex<()>>>,
}

/// A filesystem store creation error.
#[derive(Debug, Error)]
pub enum FilesystemStoreCreateError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// The base directory is an existing file.
    #[error("{} is an existing file", _0.display())]
    ExistingFile(PathBuf),
}

impl FilesystemStore {
    /// Create a new filesystem store at `base_directory`, creating the
    /// directory if it does not exist.
    ///
    /// # Errors
    /// Returns a [`FilesystemStoreCreateError`] if `base_directory` points to
    /// an existing file or cannot be created.
    pub fn new<P: AsRef<Path>>(
        base_directory: P,
    ) -> Result<FilesystemStore, FilesystemStoreCreateError> {
        let base_directory = base_directory.as_ref().to_path_buf();
        if base_directory.is_file() {
            return Err(FilesystemStoreCreateError::ExistingFile(base_directory));
        }
        let readonly = if base_directory.is_dir() {
            let metadata = std::fs::metadata(&base_directory)?;
            metadata.permissions().readonly()
        } else {
            std::fs::create_dir_all(&base_directory)?;
            false
        };
        Ok(FilesystemStore {
            base_directory,
            readonly,
            files: RwLock::new(HashMap::new()),
        })
    }

    /// Maps a store key to a filesystem path.
    ///
    /// # Errors
    /// Returns [`StorageError::InvalidKey`] for keys that would escape the
    /// base directory or contain empty components.
    fn key_to_fspath(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && key
                .split('/')
                .all(|component| !component.is_empty() && component != "." && component != "..");
        if valid {
            Ok(self.base_directory.join(key))
        } else {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }

    fn fspath_to_key(&self, path: &Path) -> Option<String> {
        let relative = pathdiff::diff_paths(path, &self.base_directory)?;
        let mut key = String::new();
        for component in relative.components() {
            if !key.is_empty() {
                key.push('/');
            }
            key.push_str(component.as_os_str().to_str()?);
        }
        Some(key)
    }

    fn with_file_lock<T>(
        &self,
        key: &str,
        f: impl FnOnce() -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        // Take the map lock briefly, then hold only the per-key lock for the
        // duration of the file operation.
        let mut files = self.files.write();
        let lock = files.entry(key.to_string()).or_default();
        let guard = lock.lock();
        let result = f();
        drop(guard);
        drop(files);
        result
    }
}

impl ReadableStorageTraits for FilesystemStore {
    fn get(&self, key: &str) -> Result<MaybeBytes, StorageError> {
        let path = self.key_to_fspath(key)?;
        self.with_file_lock(key, || {
            // Probing below a plain file (e.g. `<marker file>/.zarray` during
            // a hierarchy scan) is a missing key, not an IO error.
            if !path.is_file() {
                return Ok(None);
            }
            let mut file = match File::open(&path) {
                Ok(file) => file,
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
                Err(err) => return Err(err.into()),
            };
            let mut buffer = Vec::new();
            file.read_to_end(&mut buffer)?;
            Ok(Some(buffer))
        })
    }

    fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.key_to_fspath(key)?.is_file())
    }
}

impl WritableStorageTraits for FilesystemStore {
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::Other(
                "the filesystem store is read only".to_string(),
            ));
        }
        let path = self.key_to_fspath(key)?;
        self.with_file_lock(key, || {
            if let Some(parent) = path.parent() {
                if !parent.exists() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            // Chunk files are always fully replaced, never partially patched.
            let mut file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&path)?;
            file.write_all(value)?;
            Ok(())
        })
    }

    fn erase(&self, key: &str) -> Result<(), StorageError> {
        if self.readonly {
            return Err(StorageError::Other(
                "the filesystem store is read only".to_string(),
            ));
        }
        let path = self.key_to_fspath(key)?;
        self.with_file_lock(key, || {
            if !path.is_file() {
                return Ok(());
            }
            match std::fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
                Err(err) => Err(err.into()),
            }
        })
    }
}

impl ListableStorageTraits for FilesystemStore {
    fn list_dir(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let path = if prefix.is_empty() {
            self.base_directory.clone()
        } else {
            self.key_to_fspath(prefix)?
        };
        let mut children: Vec<String> = WalkDir::new(&path)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter_map(|entry| {
                self.fspath_to_key(entry.path())
                    .map(|key| key.rsplit('/').next().unwrap_or(&key).to_string())
            })
            .collect();
        children.dedup();
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filesystem_store_get_set_erase() {
        let directory = tempfile::TempDir::new().unwrap();
        let store = FilesystemStore::new(directory.path()).unwrap();
        assert_eq!(store.get("a/b").unwrap(), None);
        store.set("a/b", &[0, 1, 2]).unwrap();
        assert!(store.exists("a/b").unwrap());
        assert_eq!(store.get("a/b").unwrap(), Some(vec![0, 1, 2]));
        // A shorter rewrite truncates; no stale tail bytes survive.
        store.set("a/b", &[9]).unwrap();
        assert_eq!(store.get("a/b").unwrap(), Some(vec![9]));
        store.erase("a/b").unwrap();
        assert_eq!(store.get("a/b").unwrap(), None);
        store.erase("a/b").unwrap();
    }

    #[test]
    fn filesystem_store_file_in_key_path_reads_as_missing() {
        let directory = tempfile::TempDir::new().unwrap();
        let store = FilesystemStore::new(directory.path()).unwrap();
        store.set("group/.zgroup", b"{}").unwrap();
        // Keys descending through a plain file behave like absent keys.
        assert_eq!(store.get("group/.zgroup/.zarray").unwrap(), None);
        assert!(!store.exists("group/.zgroup/.zarray").unwrap());
        store.erase("group/.zgroup/.zarray").unwrap();
    }

    #[test]
    fn filesystem_store_rejects_escaping_keys() {
        let directory = tempfile::TempDir::new().unwrap();
        let store = FilesystemStore::new(directory.path()).unwrap();
        assert!(matches!(
            store.get("../escape"),
            Err(StorageError::InvalidKey(_))
        ));
        assert!(matches!(
            store.set("a//b", &[]),
            Err(StorageError::InvalidKey(_))
        ));
    }

    #[test]
    fn filesystem_store_list_dir() {
        let directory = tempfile::TempDir::new().unwrap();
        let store = FilesystemStore::new(directory.path()).unwrap();
        store.set("volume/.zgroup", &[]).unwrap();
        store.set("volume/c0/.zarray", &[]).unwrap();
        store.set("volume/c0/0.0", &[]).unwrap();
        store.set("volume/c1/.zarray", &[]).unwrap();
        assert_eq!(store.list_dir("").unwrap(), vec!["volume"]);
        assert_eq!(
            store.list_dir("volume").unwrap(),
            vec![".zgroup", "c0", "c1"]
        );
        assert!(store.list_dir("absent").unwrap().is_empty());
    }
}
