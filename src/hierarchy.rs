//! Group hierarchy operations.
//!
//! Groups and datasets are marked by `.zgroup` and `.zarray` documents below
//! their node path. These operations scan and build that structure directly
//! against a storage backend without holding any state, so concurrent
//! scanners and writers interleave freely.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::array::{ArrayMetadataV2, InvalidArrayMetadataError};
use crate::node::{NodePath, NodePathError};
use crate::storage::{
    meta_key_array, meta_key_attributes, meta_key_group, ListableStorageTraits,
    ReadableStorageTraits, StorageError, WritableStorageTraits,
};

/// Zarr V2 group metadata, the entire `.zgroup` document.
#[derive(Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Debug)]
pub struct GroupMetadataV2 {
    /// The format version, which must be `2`.
    pub zarr_format: monostate::MustBe!(2u64),
}

impl GroupMetadataV2 {
    /// Create Zarr V2 group metadata.
    #[must_use]
    pub fn new() -> Self {
        Self {
            zarr_format: monostate::MustBe!(2u64),
        }
    }
}

impl Default for GroupMetadataV2 {
    fn default() -> Self {
        Self::new()
    }
}

/// A hierarchy error.
#[derive(Debug, Error)]
pub enum HierarchyError {
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// An invalid node path.
    #[error(transparent)]
    InvalidNodePath(#[from] NodePathError),
    /// Invalid array metadata.
    #[error(transparent)]
    InvalidMetadata(#[from] InvalidArrayMetadataError),
    /// An unreadable or unwritable `.zattrs` document.
    #[error("invalid attributes document: {_0}")]
    InvalidAttributes(serde_json::Error),
}

/// Whether a group exists at `path`, marked by a `.zgroup` document.
///
/// # Errors
/// Returns a [`HierarchyError`] on a backend failure.
pub fn group_exists<TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<bool, HierarchyError> {
    Ok(storage.exists(&meta_key_group(path))?)
}

/// Whether a dataset exists at `path`, marked by a `.zarray` document that
/// parses into valid array metadata.
///
/// A present but corrupt `.zarray` reports "does not exist" rather than
/// failing, so container scans tolerate partially-written datasets.
///
/// # Errors
/// Returns a [`HierarchyError`] on a backend failure.
pub fn dataset_exists<TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<bool, HierarchyError> {
    match storage.get(&meta_key_array(path))? {
        Some(json) => Ok(ArrayMetadataV2::from_json(&json).is_ok()),
        None => Ok(false),
    }
}

/// Whether a group or dataset exists at `path`.
///
/// # Errors
/// Returns a [`HierarchyError`] on a backend failure.
pub fn node_exists<TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<bool, HierarchyError> {
    Ok(group_exists(storage, path)? || dataset_exists(storage, path)?)
}

/// The names of the immediate children of `path` that are themselves groups
/// or datasets.
///
/// # Errors
/// Returns a [`HierarchyError`] on a backend failure.
pub fn list_children<TStorage: ?Sized + ReadableStorageTraits + ListableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<Vec<String>, HierarchyError> {
    let mut children = Vec::new();
    for name in storage.list_dir(path.as_key_prefix())? {
        let Ok(child) = path.child(&name) else {
            continue;
        };
        if node_exists(storage, &child)? {
            children.push(name);
        }
    }
    Ok(children)
}

/// Read the merged attributes of the node at `path`.
///
/// The user-declared `.zattrs` document is the base (an absent document is an
/// empty set). With `metadata_mapping` enabled and a dataset at `path`, the
/// derived keys `dimensions`, `blockSize`, `dataType` and `compression` are
/// overlaid from the array metadata, taking precedence over same-named user
/// attributes. `dimensions` and `blockSize` list the fastest-varying
/// dimension first.
///
/// # Errors
/// Returns a [`HierarchyError`] on a backend failure or an unparseable
/// `.zattrs` document.
pub fn read_attributes<TStorage: ?Sized + ReadableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
    metadata_mapping: bool,
) -> Result<serde_json::Map<String, serde_json::Value>, HierarchyError> {
    let mut attributes = match storage.get(&meta_key_attributes(path))? {
        Some(json) => {
            serde_json::from_slice(&json).map_err(HierarchyError::InvalidAttributes)?
        }
        None => serde_json::Map::new(),
    };
    if !metadata_mapping {
        return Ok(attributes);
    }
    let Some(json) = storage.get(&meta_key_array(path))? else {
        return Ok(attributes);
    };
    let Ok(metadata) = ArrayMetadataV2::from_json(&json) else {
        return Ok(attributes);
    };
    let canonical = metadata.to_canonical();
    let dimensions: Vec<u64> = canonical.shape.iter().rev().copied().collect();
    let block_size: Vec<u64> = canonical.chunks.to_u64_vec().into_iter().rev().collect();
    attributes.insert("dimensions".to_string(), serde_json::json!(dimensions));
    attributes.insert("blockSize".to_string(), serde_json::json!(block_size));
    attributes.insert(
        "dataType".to_string(),
        serde_json::json!(metadata.dtype.data_type().name()),
    );
    // The compressor passes through opaquely; an unknown id stays readable.
    attributes.insert(
        "compression".to_string(),
        serde_json::to_value(&metadata.compressor)
            .map_err(HierarchyError::InvalidAttributes)?,
    );
    Ok(attributes)
}

/// Create a group at `path` by writing its `.zgroup` document.
///
/// # Errors
/// Returns a [`HierarchyError`] on a backend failure.
pub fn create_group<TStorage: ?Sized + WritableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
) -> Result<(), HierarchyError> {
    let json = serde_json::to_vec_pretty(&GroupMetadataV2::default())
        .map_err(HierarchyError::InvalidAttributes)?;
    Ok(storage.set(&meta_key_group(path), &json)?)
}

/// Create a dataset at `path` by writing its `.zarray` document.
///
/// # Errors
/// Returns a [`HierarchyError`] if the metadata is invalid or the write
/// fails.
pub fn create_array<TStorage: ?Sized + WritableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
    metadata: &ArrayMetadataV2,
) -> Result<(), HierarchyError> {
    metadata.validate()?;
    let json = metadata.to_json().map_err(InvalidArrayMetadataError::from)?;
    Ok(storage.set(&meta_key_array(path), &json)?)
}

/// Write the `.zattrs` document of the node at `path`, fully replacing any
/// existing document.
///
/// # Errors
/// Returns a [`HierarchyError`] on a backend failure.
pub fn store_attributes<TStorage: ?Sized + WritableStorageTraits>(
    storage: &TStorage,
    path: &NodePath,
    attributes: &serde_json::Map<String, serde_json::Value>,
) -> Result<(), HierarchyError> {
    let json =
        serde_json::to_vec_pretty(attributes).map_err(HierarchyError::InvalidAttributes)?;
    Ok(storage.set(&meta_key_attributes(path), &json)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::store::MemoryStore;

    const VALID_ZARRAY: &[u8] = br#"{
        "zarr_format": 2,
        "shape": [100, 200],
        "chunks": [64, 32],
        "dtype": "<u2",
        "compressor": {"id": "gzip", "level": 6},
        "fill_value": 0,
        "order": "C",
        "filters": null
    }"#;

    #[test]
    fn group_and_dataset_markers() {
        let store = MemoryStore::new();
        let group = NodePath::new("/volume").unwrap();
        let dataset = group.child("c0").unwrap();
        create_group(&store, &group).unwrap();
        store.set("volume/c0/.zarray", VALID_ZARRAY).unwrap();

        assert!(group_exists(&store, &group).unwrap());
        assert!(!dataset_exists(&store, &group).unwrap());
        assert!(dataset_exists(&store, &dataset).unwrap());
        assert!(!group_exists(&store, &dataset).unwrap());
        assert!(node_exists(&store, &group).unwrap());
        assert!(node_exists(&store, &dataset).unwrap());
        assert!(!node_exists(&store, &group.child("missing").unwrap()).unwrap());
    }

    #[test]
    fn corrupt_zarray_reports_missing_dataset() {
        let store = MemoryStore::new();
        let path = NodePath::new("/broken").unwrap();
        store.set("broken/.zarray", b"{ not json").unwrap();
        assert!(!dataset_exists(&store, &path).unwrap());
        // Mismatched dimensionality is also "does not exist".
        let mismatched = String::from_utf8_lossy(VALID_ZARRAY).replace("[64, 32]", "[64]");
        store.set("broken/.zarray", mismatched.as_bytes()).unwrap();
        assert!(!dataset_exists(&store, &path).unwrap());
    }

    #[test]
    fn list_children_filters_to_nodes() {
        let store = MemoryStore::new();
        let root = NodePath::root();
        create_group(&store, &root).unwrap();
        create_group(&store, &root.child("group").unwrap()).unwrap();
        store.set("dataset/.zarray", VALID_ZARRAY).unwrap();
        store.set("corrupt/.zarray", b"{").unwrap();
        store.set("loose/file", b"x").unwrap();

        assert_eq!(
            list_children(&store, &root).unwrap(),
            vec!["dataset", "group"]
        );
    }

    #[test]
    fn read_attributes_merges_derived_keys() {
        let store = MemoryStore::new();
        let path = NodePath::new("/volume").unwrap();
        store.set("volume/.zarray", VALID_ZARRAY).unwrap();
        store_attributes(
            &store,
            &path,
            serde_json::json!({"resolution": [4.0, 4.0], "dataType": "user-value"})
                .as_object()
                .unwrap(),
        )
        .unwrap();

        let attributes = read_attributes(&store, &path, true).unwrap();
        // User attributes survive as the base.
        assert_eq!(attributes["resolution"], serde_json::json!([4.0, 4.0]));
        // Derived keys win collisions and list the fastest dimension first.
        assert_eq!(attributes["dataType"], serde_json::json!("uint16"));
        assert_eq!(attributes["dimensions"], serde_json::json!([200, 100]));
        assert_eq!(attributes["blockSize"], serde_json::json!([32, 64]));
        assert_eq!(attributes["compression"]["id"], serde_json::json!("gzip"));

        // Without metadata mapping, only user attributes come back.
        let attributes = read_attributes(&store, &path, false).unwrap();
        assert_eq!(attributes["dataType"], serde_json::json!("user-value"));
        assert!(!attributes.contains_key("dimensions"));
    }

    #[test]
    fn read_attributes_missing_zattrs_is_empty() {
        let store = MemoryStore::new();
        let path = NodePath::new("/volume").unwrap();
        assert!(read_attributes(&store, &path, false).unwrap().is_empty());
    }

    #[test]
    fn read_attributes_f_order_dimensions() {
        let store = MemoryStore::new();
        let path = NodePath::new("/volume").unwrap();
        let f_order = String::from_utf8_lossy(VALID_ZARRAY).replace("\"C\"", "\"F\"");
        store.set("volume/.zarray", f_order.as_bytes()).unwrap();
        let attributes = read_attributes(&store, &path, true).unwrap();
        // F order shape [100, 200] already lists the fastest dimension first.
        assert_eq!(attributes["dimensions"], serde_json::json!([100, 200]));
        assert_eq!(attributes["blockSize"], serde_json::json!([64, 32]));
    }

    #[test]
    fn group_metadata_round_trip() {
        let json = serde_json::to_string(&GroupMetadataV2::default()).unwrap();
        assert_eq!(json, r#"{"zarr_format":2}"#);
        assert!(serde_json::from_str::<GroupMetadataV2>(r#"{"zarr_format":3}"#).is_err());
    }
}
