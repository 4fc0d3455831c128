//! Zarr V2 arrays.
//!
//! An [`Array`] binds a storage backend, a node path and parsed `.zarray`
//! metadata, and moves whole chunks in and out of storage. Chunk buffers are
//! flat native-byte-order byte vectors covering the nominal chunk shape; the
//! typed view is the caller's concern.

mod array_sync_readable;
mod array_sync_writable;
pub mod chunk_codec;
mod chunk_key;
mod compressor;
mod data_type;
mod endianness;
mod fill_value;
mod metadata;
mod type_descriptor;

use std::sync::Arc;

use thiserror::Error;

pub use chunk_key::{chunk_key, ChunkKeySeparator};
pub use compressor::{
    BloscCompressionLevel, BloscCompressor, BloscCompressorConfiguration, BloscShuffleMode,
    Bz2CompressionLevel, Bz2CompressorConfiguration, CodecError, CompressionLevelError,
    Compressor, GzipCompressionLevel, GzipCompressorConfiguration, UnknownCompressorError,
};
pub use data_type::{DataType, UnsupportedDataTypeError, ZARR_NAN_F32, ZARR_NAN_F64};
pub use endianness::{Endianness, NATIVE_ENDIAN};
pub use fill_value::{FillValue, FillValueMetadataV2, FillValueParseError};
pub use metadata::{
    ArrayMetadataV2, ArrayMetadataV2Order, ChunkShape, CompressorMetadataV2,
    InvalidArrayMetadataError,
};
pub use type_descriptor::{TypeDescriptor, TypeDescriptorError, TypeKind};

use crate::node::{NodePath, NodePathError};
use crate::storage::StorageError;

/// An array error.
#[derive(Debug, Error)]
pub enum ArrayError {
    /// A storage error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// No `.zarray` document at the array path.
    #[error("no array metadata at {_0}")]
    MissingMetadata(NodePath),
    /// Invalid array metadata.
    #[error(transparent)]
    InvalidMetadata(#[from] InvalidArrayMetadataError),
    /// The metadata declares a compressor this crate does not recognise.
    #[error(transparent)]
    UnknownCompressor(#[from] UnknownCompressorError),
    /// A chunk encode or decode failure.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    /// A chunk grid position outside the chunk grid.
    #[error("chunk grid position {_0:?} is out of bounds for chunk grid {_1:?}")]
    InvalidChunkGridPosition(Vec<u64>, Vec<u64>),
    /// An invalid node path.
    #[error(transparent)]
    InvalidNodePath(#[from] NodePathError),
}

/// A Zarr V2 array at a node path within a store.
///
/// Construction canonicalises the metadata (see
/// [`ArrayMetadataV2::to_canonical`]); all shape, chunk and grid accessors
/// report the canonical row-major view, while [`Array::metadata`] retains the
/// document as stored for persistence.
pub struct Array<TStorage: ?Sized> {
    storage: Arc<TStorage>,
    path: NodePath,
    metadata: ArrayMetadataV2,
    canonical: ArrayMetadataV2,
    compressor: Compressor,
    fill_value: FillValue,
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// Create an array from existing metadata without touching storage.
    ///
    /// The fill value is resolved tolerantly: an unparseable literal becomes
    /// zero bytes with a logged warning (use
    /// [`FillValue::from_metadata`] directly for the strict behaviour).
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the metadata is structurally invalid or
    /// declares an unknown compressor.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: NodePath,
        metadata: ArrayMetadataV2,
    ) -> Result<Self, ArrayError> {
        metadata.validate()?;
        let canonical = metadata.to_canonical();
        let compressor = metadata.compressor()?.unwrap_or(Compressor::Raw);
        let fill_value =
            FillValue::from_metadata_lossy(&metadata.fill_value, &metadata.dtype);
        Ok(Self {
            storage,
            path,
            metadata,
            canonical,
            compressor,
            fill_value,
        })
    }

    /// The array path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// The metadata as stored, with its original dimension order.
    #[must_use]
    pub const fn metadata(&self) -> &ArrayMetadataV2 {
        &self.metadata
    }

    /// The canonical row-major metadata.
    #[must_use]
    pub const fn canonical_metadata(&self) -> &ArrayMetadataV2 {
        &self.canonical
    }

    /// The canonical array shape, slowest-varying dimension first.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.canonical.shape
    }

    /// The canonical chunk shape.
    #[must_use]
    pub const fn chunk_shape(&self) -> &ChunkShape {
        &self.canonical.chunks
    }

    /// The element data type.
    #[must_use]
    pub fn data_type(&self) -> DataType {
        self.canonical.dtype.data_type()
    }

    /// The resolved fill value.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// The resolved compressor.
    #[must_use]
    pub const fn compressor(&self) -> &Compressor {
        &self.compressor
    }

    /// Per-dimension chunk counts, canonical order.
    #[must_use]
    pub fn chunk_grid_shape(&self) -> Vec<u64> {
        self.canonical.chunk_grid_shape()
    }

    /// The storage key of the chunk at `grid_position` relative to the store
    /// root.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridPosition`] if `grid_position` is
    /// outside the chunk grid.
    pub fn chunk_key(&self, grid_position: &[u64]) -> Result<String, ArrayError> {
        self.validate_grid_position(grid_position)?;
        // The metadata is canonical row-major here, so the key encoder always
        // takes the reversing branch.
        let key = chunk_key(grid_position, self.canonical.dimension_separator, true);
        Ok(crate::storage::data_key(&self.path, &key))
    }

    fn validate_grid_position(&self, grid_position: &[u64]) -> Result<(), ArrayError> {
        let grid_shape = self.chunk_grid_shape();
        let in_bounds = grid_position.len() == grid_shape.len()
            && std::iter::zip(grid_position, &grid_shape)
                .all(|(index, extent)| index < extent);
        if in_bounds {
            Ok(())
        } else {
            Err(ArrayError::InvalidChunkGridPosition(
                grid_position.to_vec(),
                grid_shape,
            ))
        }
    }

    /// A decoded chunk buffer holding only fill values.
    #[must_use]
    pub fn fill_chunk_bytes(&self) -> Vec<u8> {
        let expected = chunk_codec::decoded_chunk_size(&self.canonical);
        let num_elements =
            usize::try_from(self.canonical.chunks.num_elements()).unwrap_or(usize::MAX);
        if self.fill_value.size() * num_elements == expected {
            self.fill_value.as_ne_bytes().repeat(num_elements)
        } else {
            // Bit-packed element types fill with zero bytes.
            vec![0u8; expected]
        }
    }
}
