#![allow(missing_docs)]

use std::sync::Arc;

use zarr2::array::{Array, ArrayMetadataV2};
use zarr2::hierarchy::{
    create_array, create_group, dataset_exists, group_exists, list_children, node_exists,
    read_attributes, store_attributes,
};
use zarr2::node::NodePath;
use zarr2::storage::store::FilesystemStore;
use zarr2::storage::{ReadableStorageTraits, WritableStorageTraits};

const ZARRAY: &[u8] = br#"{
    "zarr_format": 2,
    "shape": [50, 60],
    "chunks": [16, 16],
    "dtype": "<f4",
    "compressor": {"id": "gzip", "level": 6},
    "fill_value": "NaN",
    "order": "C",
    "filters": null
}"#;

#[test]
fn container_scan_on_filesystem() {
    let directory = tempfile::TempDir::new().unwrap();
    let store = FilesystemStore::new(directory.path()).unwrap();

    let root = NodePath::root();
    let group = root.child("em").unwrap();
    let dataset = group.child("s0").unwrap();
    create_group(&store, &root).unwrap();
    create_group(&store, &group).unwrap();
    create_array(
        &store,
        &dataset,
        &ArrayMetadataV2::from_json(ZARRAY).unwrap(),
    )
    .unwrap();
    // A partially-written sibling with a corrupt marker.
    store.set("em/broken/.zarray", b"{ \"zarr_format\": ").unwrap();
    // A stray non-node directory.
    store.set("em/scratch/notes.txt", b"x").unwrap();

    assert!(group_exists(&store, &root).unwrap());
    assert!(group_exists(&store, &group).unwrap());
    assert!(dataset_exists(&store, &dataset).unwrap());
    assert!(!dataset_exists(&store, &group.child("broken").unwrap()).unwrap());
    assert!(!node_exists(&store, &group.child("scratch").unwrap()).unwrap());

    // Enumeration skips the corrupt dataset instead of aborting.
    assert_eq!(list_children(&store, &root).unwrap(), vec!["em"]);
    assert_eq!(list_children(&store, &group).unwrap(), vec!["s0"]);
}

#[test]
fn attribute_overlay_round_trip() {
    let directory = tempfile::TempDir::new().unwrap();
    let store = Arc::new(FilesystemStore::new(directory.path()).unwrap());

    let dataset = NodePath::new("/em/s0").unwrap();
    create_array(
        store.as_ref(),
        &dataset,
        &ArrayMetadataV2::from_json(ZARRAY).unwrap(),
    )
    .unwrap();
    store_attributes(
        store.as_ref(),
        &dataset,
        serde_json::json!({"resolution": [8, 8], "unit": "nm"})
            .as_object()
            .unwrap(),
    )
    .unwrap();

    let attributes = read_attributes(store.as_ref(), &dataset, true).unwrap();
    assert_eq!(attributes["unit"], serde_json::json!("nm"));
    assert_eq!(attributes["dimensions"], serde_json::json!([60, 50]));
    assert_eq!(attributes["blockSize"], serde_json::json!([16, 16]));
    assert_eq!(attributes["dataType"], serde_json::json!("float32"));
    assert_eq!(attributes["compression"]["id"], serde_json::json!("gzip"));
    assert_eq!(attributes["compression"]["level"], serde_json::json!(6));

    // A plain read never persists derived keys back into .zattrs.
    let stored = store
        .get(&zarr2::storage::meta_key_attributes(&dataset))
        .unwrap()
        .unwrap();
    assert!(!String::from_utf8(stored).unwrap().contains("dimensions"));

    // The dataset opens and reports the NaN fill value.
    let array = Array::open(store, "/em/s0").unwrap();
    let fill = f32::from_ne_bytes(array.fill_value().as_ne_bytes().try_into().unwrap());
    assert!(fill.is_nan());
}
