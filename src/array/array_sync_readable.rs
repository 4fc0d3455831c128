//! Synchronous read operations on an [`Array`].

use std::sync::Arc;

use super::{chunk_codec, Array, ArrayError, ArrayMetadataV2};
use crate::node::NodePath;
use crate::storage::{meta_key_array, MaybeBytes, ReadableStorageTraits};

impl<TStorage: ?Sized + ReadableStorageTraits> Array<TStorage> {
    /// Open an existing array at `path` by reading its `.zarray` document.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the path is invalid, the document is
    /// absent or invalid, or the compressor is unknown.
    pub fn open(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayError> {
        let path = NodePath::new(path)?;
        let json = storage
            .get(&meta_key_array(&path))?
            .ok_or_else(|| ArrayError::MissingMetadata(path.clone()))?;
        let metadata = ArrayMetadataV2::from_json(&json)?;
        Self::new_with_metadata(storage, path, metadata)
    }

    /// Retrieve and decode the chunk at `grid_position`.
    ///
    /// Returns [`None`] for a chunk with no stored bytes; the caller
    /// substitutes fill values (see [`Array::retrieve_chunk_or_fill`]).
    /// A transient backend failure is logged and also reported as [`None`],
    /// so an intermittent failure during a long scan does not abort the whole
    /// traversal.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `grid_position` is out of bounds, the
    /// backend fails non-transiently, or the stored bytes do not decode.
    pub fn retrieve_chunk(&self, grid_position: &[u64]) -> Result<MaybeBytes, ArrayError> {
        let key = self.chunk_key(grid_position)?;
        let encoded = match self.storage.get(&key) {
            Ok(encoded) => encoded,
            Err(err) if err.is_transient() => {
                log::warn!("treating chunk {key} as missing: {err}");
                None
            }
            Err(err) => return Err(err.into()),
        };
        match encoded {
            Some(encoded) => Ok(Some(chunk_codec::decode_chunk(
                encoded,
                &self.canonical,
                &self.compressor,
            )?)),
            None => Ok(None),
        }
    }

    /// Retrieve the chunk at `grid_position`, substituting a fill-value
    /// buffer if it has no stored bytes.
    ///
    /// # Errors
    /// See [`Array::retrieve_chunk`].
    pub fn retrieve_chunk_or_fill(&self, grid_position: &[u64]) -> Result<Vec<u8>, ArrayError> {
        Ok(self
            .retrieve_chunk(grid_position)?
            .unwrap_or_else(|| self.fill_chunk_bytes()))
    }

    /// Whether the chunk at `grid_position` has stored bytes.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if `grid_position` is out of bounds or the
    /// backend fails.
    pub fn chunk_exists(&self, grid_position: &[u64]) -> Result<bool, ArrayError> {
        let key = self.chunk_key(grid_position)?;
        Ok(self.storage.exists(&key)?)
    }
}
