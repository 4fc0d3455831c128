//! An in-memory store.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use crate::storage::{
    ListableStorageTraits, MaybeBytes, ReadableStorageTraits, StorageError,
    WritableStorageTraits,
};

/// An in-memory store, mainly for testing.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new empty memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReadableStorageTraits for MemoryStore {
    fn get(&self, key: &str) -> Result<MaybeBytes, StorageError> {
        Ok(self.data.read().get(key).cloned())
    }

    fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Ok(self.data.read().contains_key(key))
    }
}

impl WritableStorageTraits for MemoryStore {
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError> {
        self.data.write().insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn erase(&self, key: &str) -> Result<(), StorageError> {
        self.data.write().remove(key);
        Ok(())
    }
}

impl ListableStorageTraits for MemoryStore {
    fn list_dir(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
        let data = self.data.read();
        let mut children: Vec<String> = Vec::new();
        for key in data.keys() {
            let relative = if prefix.is_empty() {
                key.as_str()
            } else if let Some(relative) = key
                .strip_prefix(prefix)
                .and_then(|relative| relative.strip_prefix('/'))
            {
                relative
            } else {
                continue;
            };
            let child = relative.split('/').next().unwrap_or(relative);
            if !child.is_empty() && children.last().map(String::as_str) != Some(child) {
                children.push(child.to_string());
            }
        }
        // Keys iterate in sorted order, so only adjacent duplicates occur.
        Ok(children)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_get_set_erase() {
        let store = MemoryStore::new();
        assert_eq!(store.get("a/b").unwrap(), None);
        store.set("a/b", &[1, 2, 3]).unwrap();
        assert!(store.exists("a/b").unwrap());
        assert_eq!(store.get("a/b").unwrap(), Some(vec![1, 2, 3]));
        // Set fully replaces.
        store.set("a/b", &[4]).unwrap();
        assert_eq!(store.get("a/b").unwrap(), Some(vec![4]));
        store.erase("a/b").unwrap();
        assert_eq!(store.get("a/b").unwrap(), None);
        // Erasing a missing key succeeds.
        store.erase("a/b").unwrap();
    }

    #[test]
    fn memory_store_list_dir() {
        let store = MemoryStore::new();
        store.set(".zgroup", &[]).unwrap();
        store.set("volume/.zgroup", &[]).unwrap();
        store.set("volume/c0/.zarray", &[]).unwrap();
        store.set("volume/c0/0.0", &[]).unwrap();
        store.set("volume/c1/.zarray", &[]).unwrap();
        assert_eq!(store.list_dir("").unwrap(), vec![".zgroup", "volume"]);
        assert_eq!(store.list_dir("volume").unwrap(), vec![".zgroup", "c0", "c1"]);
        assert_eq!(store.list_dir("volume/c0").unwrap(), vec![".zarray", "0.0"]);
        assert!(store.list_dir("absent").unwrap().is_empty());
    }
}
