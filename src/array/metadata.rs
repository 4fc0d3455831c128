//! The Zarr V2 `.zarray` document model.

use std::num::NonZeroU32;

use derive_more::{Deref, Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{ChunkKeySeparator, Compressor, FillValueMetadataV2, TypeDescriptor, UnknownCompressorError};

/// The shape of a chunk, with positive extents.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Deref, From)]
#[serde(transparent)]
pub struct ChunkShape(Vec<NonZeroU32>);

impl ChunkShape {
    /// The number of elements in one chunk.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.0.iter().map(|extent| u64::from(extent.get())).product()
    }

    /// The chunk extents widened to `u64`.
    #[must_use]
    pub fn to_u64_vec(&self) -> Vec<u64> {
        self.0
            .iter()
            .map(|extent| u64::from(extent.get()))
            .collect()
    }
}

impl TryFrom<&[u32]> for ChunkShape {
    type Error = std::num::TryFromIntError;

    fn try_from(extents: &[u32]) -> Result<Self, Self::Error> {
        extents
            .iter()
            .map(|extent| NonZeroU32::try_from(*extent))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

/// The memory layout of the elements within a chunk.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum ArrayMetadataV2Order {
    /// Row-major order. The last dimension varies fastest.
    C,
    /// Column-major order. The first dimension varies fastest.
    F,
}

/// Raw compressor metadata: the `id` discriminator plus opaque parameters.
///
/// Parsing a `.zarray` keeps the compressor in this raw form so that an
/// unrecognised id does not fail the document parse. Resolution to a
/// [`Compressor`](crate::array::Compressor) happens when chunk bytes must
/// actually be encoded or decoded, and only fails there.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
pub struct CompressorMetadataV2 {
    id: String,
    #[serde(flatten)]
    configuration: serde_json::Map<String, serde_json::Value>,
}

impl CompressorMetadataV2 {
    /// Create compressor metadata from an id and its parameters.
    #[must_use]
    pub fn new(id: &str, configuration: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            id: id.to_string(),
            configuration,
        }
    }

    /// The compressor id discriminator.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The compressor parameters, excluding the id.
    #[must_use]
    pub const fn configuration(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.configuration
    }
}

/// An invalid `.zarray` document error.
#[derive(Debug, Error)]
pub enum InvalidArrayMetadataError {
    /// The document is not valid JSON or is missing required fields.
    #[error(transparent)]
    InvalidJson(#[from] serde_json::Error),
    /// `shape` and `chunks` have different dimensionality.
    #[error("shape has {_0} dimensions but chunks has {_1}")]
    DimensionalityMismatch(usize, usize),
}

/// Zarr V2 array metadata, one `.zarray` document per dataset path.
///
/// Unrecognised fields are tolerated and dropped; the `dimension_separator`
/// extension field is honoured. User attributes live in the sibling `.zattrs`
/// document and are not part of this model.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ArrayMetadataV2 {
    /// The format version, which must be `2`.
    pub zarr_format: monostate::MustBe!(2u64),
    /// The array shape, one extent per dimension.
    pub shape: Vec<u64>,
    /// The chunk shape, with the dimensionality of `shape`.
    pub chunks: ChunkShape,
    /// The element type descriptor.
    pub dtype: TypeDescriptor,
    /// The chunk compressor, or none for uncompressed chunks.
    pub compressor: Option<CompressorMetadataV2>,
    /// The fill value for unwritten regions.
    pub fill_value: FillValueMetadataV2,
    /// The memory layout of chunk elements.
    pub order: ArrayMetadataV2Order,
    /// An optional chain of pre/post-compression filters, carried opaquely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<CompressorMetadataV2>>,
    /// The chunk key separator (OME-NGFF extension), defaulting to `.`.
    #[serde(default)]
    pub dimension_separator: ChunkKeySeparator,
}

impl ArrayMetadataV2 {
    /// Create array metadata with no compressor, a null fill value and no
    /// filters.
    #[must_use]
    pub fn new(
        shape: Vec<u64>,
        chunks: ChunkShape,
        dtype: TypeDescriptor,
        order: ArrayMetadataV2Order,
    ) -> Self {
        Self {
            zarr_format: monostate::MustBe!(2u64),
            shape,
            chunks,
            dtype,
            compressor: None,
            fill_value: FillValueMetadataV2::Null,
            order,
            filters: None,
            dimension_separator: ChunkKeySeparator::default(),
        }
    }

    /// Parse and validate a `.zarray` document.
    ///
    /// # Errors
    /// Returns [`InvalidArrayMetadataError`] if the document is not valid
    /// JSON, is missing a required field, or declares mismatched `shape` and
    /// `chunks` dimensionality.
    pub fn from_json(json: &[u8]) -> Result<Self, InvalidArrayMetadataError> {
        let metadata: Self = serde_json::from_slice(json)?;
        metadata.validate()?;
        Ok(metadata)
    }

    /// Serialise to a pretty-printed `.zarray` document.
    ///
    /// # Errors
    /// Returns a [`serde_json::Error`] if serialisation fails.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec_pretty(self)
    }

    /// Check structural invariants beyond field presence.
    ///
    /// # Errors
    /// Returns [`InvalidArrayMetadataError::DimensionalityMismatch`] if
    /// `shape` and `chunks` differ in dimensionality.
    pub fn validate(&self) -> Result<(), InvalidArrayMetadataError> {
        if self.shape.len() == self.chunks.len() {
            Ok(())
        } else {
            Err(InvalidArrayMetadataError::DimensionalityMismatch(
                self.shape.len(),
                self.chunks.len(),
            ))
        }
    }

    /// Whether chunk elements are laid out in row-major order.
    #[must_use]
    pub fn is_row_major(&self) -> bool {
        self.order == ArrayMetadataV2Order::C
    }

    /// Return a canonical row-major copy of this metadata.
    ///
    /// Column-major (`F`) metadata has its `shape` and `chunks` reversed and
    /// its order rewritten to `C`, so that the slowest-varying dimension comes
    /// first everywhere downstream. Row-major metadata is returned unchanged,
    /// making the transform idempotent. Chunk key construction performs the
    /// matching index reversal; the reversal must happen exactly once overall.
    #[must_use]
    pub fn to_canonical(&self) -> Self {
        match self.order {
            ArrayMetadataV2Order::C => self.clone(),
            ArrayMetadataV2Order::F => {
                let mut canonical = self.clone();
                canonical.shape.reverse();
                let mut chunks = canonical.chunks.0;
                chunks.reverse();
                canonical.chunks = ChunkShape(chunks);
                canonical.order = ArrayMetadataV2Order::C;
                canonical
            }
        }
    }

    /// The shape of the chunk grid: per-dimension chunk counts, rounding up
    /// for partially-filled boundary chunks.
    #[must_use]
    pub fn chunk_grid_shape(&self) -> Vec<u64> {
        std::iter::zip(&self.shape, self.chunks.iter())
            .map(|(extent, chunk_extent)| extent.div_ceil(u64::from(chunk_extent.get())))
            .collect()
    }

    /// Resolve the compressor, if any.
    ///
    /// # Errors
    /// Returns [`UnknownCompressorError`] if a compressor is declared but its
    /// id is not recognised.
    pub fn compressor(&self) -> Result<Option<Compressor>, UnknownCompressorError> {
        self.compressor
            .as_ref()
            .map(Compressor::from_metadata)
            .transpose()
    }
}
