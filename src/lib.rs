//! A rust library for the [Zarr V2](https://zarr-specs.readthedocs.io/en/latest/v2/v2.0.html) storage format for chunked multidimensional arrays and metadata.
//!
//! Datasets live below group nodes in a hierarchy, marked by `.zgroup`,
//! `.zarray` and `.zattrs` JSON documents, with each chunk stored as an
//! independently addressed value. The honoured dialect is the one produced
//! by `zarr-python` and OME-NGFF tooling, including the optional
//! `dimension_separator` field.
//!
//! ## Example
//! ```rust,ignore
//! # use std::sync::Arc;
//! let store = Arc::new(zarr2::storage::store::FilesystemStore::new(
//!     "/path/to/container.zarr",
//! )?);
//!
//! let array = zarr2::array::Array::open(store, "/volume/c0")?;
//! if let Some(chunk) = array.retrieve_chunk(&[1, 0])? {
//!     println!("chunk [1, 0] holds {} bytes", chunk.len());
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Crate Features
//! - Codecs (all default): `gzip` (also covers `zlib`), `bz2`, `blosc`.
//!
//! ## Licence
//! `zarr2` is licensed under either of
//!  - the Apache License, Version 2.0 or <http://www.apache.org/licenses/LICENSE-2.0> or
//!  - the MIT license or <http://opensource.org/licenses/MIT>, at your option.

#![warn(unused_variables)]
#![warn(dead_code)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::missing_panics_doc)]

pub mod array;
pub mod hierarchy;
pub mod node;
pub mod storage;
