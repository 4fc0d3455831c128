//! Byte-stream storage backends.
//!
//! A store holds opaque byte values addressed by `/`-separated keys relative
//! to the store root. Arrays and hierarchies are layered on top through the
//! key helpers in this module. All operations are synchronous and blocking;
//! concurrency comes from callers invoking them from multiple threads.

pub mod store;

use std::sync::Arc;

use thiserror::Error;

use crate::node::NodePath;

/// The bytes of a value, or [`None`] if the key does not exist.
pub type MaybeBytes = Option<Vec<u8>>;

/// A storage error.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An IO error from the backend.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An intermittent backend failure. Reads treat the affected key as
    /// missing instead of aborting a traversal; see
    /// [`StorageError::is_transient`].
    #[error("transient failure on key {key}: {reason}")]
    Transient {
        /// The key the backend failed on.
        key: String,
        /// A backend-specific description of the failure.
        reason: String,
    },
    /// A key that cannot be mapped onto the backend.
    #[error("invalid store key {_0:?}")]
    InvalidKey(String),
    /// Any other backend failure.
    #[error("{_0}")]
    Other(String),
}

impl StorageError {
    /// Whether this error is an intermittent backend failure that read paths
    /// should downgrade to a missing value.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Readable storage.
pub trait ReadableStorageTraits: Send + Sync {
    /// Retrieve the value at `key`, or [`None`] if absent.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on a backend failure.
    fn get(&self, key: &str) -> Result<MaybeBytes, StorageError>;

    /// Whether `key` holds a value.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on a backend failure.
    fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Writable storage.
pub trait WritableStorageTraits: Send + Sync {
    /// Store `value` at `key`, fully replacing any existing value.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on a backend failure.
    fn set(&self, key: &str, value: &[u8]) -> Result<(), StorageError>;

    /// Erase the value at `key`. Succeeds if the key does not exist.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on a backend failure.
    fn erase(&self, key: &str) -> Result<(), StorageError>;
}

/// Listable storage.
pub trait ListableStorageTraits: Send + Sync {
    /// The names of the immediate children below `prefix`, sorted and
    /// deduplicated. Both leaf values and intermediate directories count as
    /// children. The root is the empty prefix.
    ///
    /// # Errors
    /// Returns a [`StorageError`] on a backend failure.
    fn list_dir(&self, prefix: &str) -> Result<Vec<String>, StorageError>;
}

/// Readable and writable storage.
pub trait ReadableWritableStorageTraits: ReadableStorageTraits + WritableStorageTraits {}
impl<T: ReadableStorageTraits + WritableStorageTraits + ?Sized> ReadableWritableStorageTraits for T {}

/// Readable and listable storage.
pub trait ReadableListableStorageTraits: ReadableStorageTraits + ListableStorageTraits {}
impl<T: ReadableStorageTraits + ListableStorageTraits + ?Sized> ReadableListableStorageTraits for T {}

/// An [`Arc`] wrapped readable storage backend.
pub type ReadableStorage = Arc<dyn ReadableStorageTraits>;
/// An [`Arc`] wrapped writable storage backend.
pub type WritableStorage = Arc<dyn WritableStorageTraits>;
/// An [`Arc`] wrapped listable storage backend.
pub type ListableStorage = Arc<dyn ListableStorageTraits>;

fn node_key(path: &NodePath, name: &str) -> String {
    let prefix = path.as_key_prefix();
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}/{name}")
    }
}

/// The key of the `.zarray` document of the dataset at `path`.
#[must_use]
pub fn meta_key_array(path: &NodePath) -> String {
    node_key(path, ".zarray")
}

/// The key of the `.zgroup` document of the group at `path`.
#[must_use]
pub fn meta_key_group(path: &NodePath) -> String {
    node_key(path, ".zgroup")
}

/// The key of the `.zattrs` document of the node at `path`.
#[must_use]
pub fn meta_key_attributes(path: &NodePath) -> String {
    node_key(path, ".zattrs")
}

/// The key of the chunk of the dataset at `path` with the encoded `chunk_key`.
#[must_use]
pub fn data_key(path: &NodePath, chunk_key: &str) -> String {
    node_key(path, chunk_key)
}
