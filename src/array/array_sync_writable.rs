//! Synchronous write operations on an [`Array`].

use super::{chunk_codec, Array, ArrayError, CodecError, InvalidArrayMetadataError, TypeKind};
use crate::storage::{meta_key_array, meta_key_attributes, WritableStorageTraits};

impl<TStorage: ?Sized + WritableStorageTraits> Array<TStorage> {
    /// Write the `.zarray` document, fully replacing any existing document.
    ///
    /// The document is written as provided at construction, preserving the
    /// original dimension order of `F` order arrays.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if serialisation or the write fails.
    pub fn store_metadata(&self) -> Result<(), ArrayError> {
        let json = self
            .metadata
            .to_json()
            .map_err(InvalidArrayMetadataError::from)?;
        Ok(self.storage.set(&meta_key_array(&self.path), &json)?)
    }

    /// Write the `.zattrs` document, fully replacing any existing document.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if serialisation or the write fails.
    pub fn store_attributes(
        &self,
        attributes: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<(), ArrayError> {
        let json = serde_json::to_vec_pretty(attributes)
            .map_err(InvalidArrayMetadataError::from)?;
        Ok(self
            .storage
            .set(&meta_key_attributes(&self.path), &json)?)
    }

    /// Encode and store a full-shape chunk at `grid_position`.
    ///
    /// `chunk_bytes` must cover the nominal chunk shape exactly; for boundary
    /// chunks use [`Array::store_chunk_with_shape`].
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `grid_position` is out of bounds, the
    /// buffer size is wrong, or encoding or the write fails.
    pub fn store_chunk(
        &self,
        grid_position: &[u64],
        chunk_bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        let key = self.chunk_key(grid_position)?;
        let encoded = chunk_codec::encode_chunk(chunk_bytes, &self.canonical, &self.compressor)?;
        Ok(self.storage.set(&key, &encoded)?)
    }

    /// Encode and store a chunk whose buffer does not cover the nominal chunk
    /// shape.
    ///
    /// The buffer is padded up to the chunk shape with fill values, or
    /// cropped down to it, before encoding. This is how boundary chunks
    /// smaller than the nominal chunk size are written. Bit-packed element
    /// types cannot be resized element-wise; their chunks must be written at
    /// the full shape with [`Array::store_chunk`].
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `grid_position` is out of bounds, the
    /// buffer is inconsistent with `buffer_shape`, the element type is bit
    /// packed, or encoding or the write fails.
    pub fn store_chunk_with_shape(
        &self,
        grid_position: &[u64],
        buffer_shape: &[u64],
        chunk_bytes: Vec<u8>,
    ) -> Result<(), ArrayError> {
        let chunk_shape = self.canonical.chunks.to_u64_vec();
        if buffer_shape == chunk_shape {
            return self.store_chunk(grid_position, chunk_bytes);
        }
        if self.canonical.dtype.kind() == TypeKind::Bit {
            return Err(CodecError::Other(
                "bit packed chunks cannot be padded or cropped; write the full chunk shape"
                    .to_string(),
            )
            .into());
        }
        let padded = chunk_codec::pad_or_crop(
            &chunk_bytes,
            buffer_shape,
            &chunk_shape,
            self.data_type().size(),
            &self.fill_value,
        )?;
        self.store_chunk(grid_position, padded)
    }

    /// Erase the chunk at `grid_position`. Succeeds if it does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `grid_position` is out of bounds or the
    /// erase fails.
    pub fn erase_chunk(&self, grid_position: &[u64]) -> Result<(), ArrayError> {
        let key = self.chunk_key(grid_position)?;
        Ok(self.storage.erase(&key)?)
    }
}
