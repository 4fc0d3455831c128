//! Chunk encode and decode pipelines.
//!
//! A decoded chunk is a fixed-size native-byte-order buffer covering the full
//! nominal chunk shape. Encoding applies the declared byte order and the
//! array's compressor; decoding undoes both and validates the size. Boundary
//! chunks are padded (or cropped) to the nominal shape with fill bytes before
//! encoding.
//!
//! All functions here consume canonical row-major metadata; see
//! [`ArrayMetadataV2::to_canonical`].

use super::{
    ArrayMetadataV2, CodecError, Compressor, FillValue, NATIVE_ENDIAN, TypeKind,
};

/// The expected byte length of a decoded chunk, honouring bit packing.
#[must_use]
pub fn decoded_chunk_size(metadata: &ArrayMetadataV2) -> usize {
    let num_elements = usize::try_from(metadata.chunks.num_elements()).unwrap_or(usize::MAX);
    match metadata.dtype.kind() {
        TypeKind::Bit => (num_elements * metadata.dtype.width_bits()).div_ceil(8),
        _ => num_elements * metadata.dtype.data_type().size(),
    }
}

fn swap_byte_order_if_needed(bytes: &mut [u8], metadata: &ArrayMetadataV2) {
    let component_size = metadata.dtype.data_type().component_size();
    if component_size > 1 && metadata.dtype.effective_endianness() != NATIVE_ENDIAN {
        bytes
            .chunks_exact_mut(component_size)
            .for_each(<[u8]>::reverse);
    }
}

/// Decode stored chunk bytes into a native-byte-order element buffer.
///
/// Decompresses with `compressor`, validates the decoded size against the
/// nominal chunk shape, then byte-swaps multi-byte elements whose declared
/// byte order differs from the platform's. Single-byte element types pass
/// through untouched.
///
/// # Errors
/// Returns a [`CodecError`] if decompression fails or the decompressed size
/// does not match the chunk shape.
pub fn decode_chunk(
    encoded: Vec<u8>,
    metadata: &ArrayMetadataV2,
    compressor: &Compressor,
) -> Result<Vec<u8>, CodecError> {
    let mut decoded = compressor.decode(encoded)?;
    let expected = decoded_chunk_size(metadata);
    if decoded.len() != expected {
        return Err(CodecError::UnexpectedChunkSize(decoded.len(), expected));
    }
    swap_byte_order_if_needed(&mut decoded, metadata);
    Ok(decoded)
}

/// Encode a native-byte-order element buffer into stored chunk bytes.
///
/// The buffer must cover the full nominal chunk shape; pad boundary chunks
/// with [`pad_or_crop`] first.
///
/// # Errors
/// Returns a [`CodecError`] if the buffer size does not match the chunk shape
/// or compression fails.
pub fn encode_chunk(
    mut decoded: Vec<u8>,
    metadata: &ArrayMetadataV2,
    compressor: &Compressor,
) -> Result<Vec<u8>, CodecError> {
    let expected = decoded_chunk_size(metadata);
    if decoded.len() != expected {
        return Err(CodecError::UnexpectedChunkSize(decoded.len(), expected));
    }
    swap_byte_order_if_needed(&mut decoded, metadata);
    compressor.encode(decoded, metadata.dtype.data_type().component_size())
}

fn byte_strides(shape: &[u64], element_size: usize) -> Vec<usize> {
    let mut strides = vec![element_size; shape.len()];
    for d in (0..shape.len().saturating_sub(1)).rev() {
        strides[d] = strides[d + 1] * usize::try_from(shape[d + 1]).unwrap_or(usize::MAX);
    }
    strides
}

/// Resize a row-major element buffer from `source_shape` to `target_shape`.
///
/// The overlapping region is copied element for element; any region outside
/// the source is filled with `fill_value`. Padding and cropping are the same
/// strided copy, so boundary chunks can be grown to the nominal chunk shape
/// and oversized buffers shrunk with one code path.
///
/// # Errors
/// Returns a [`CodecError`] if the shapes differ in dimensionality, or if the
/// buffer or fill value size is inconsistent with `element_size`.
pub fn pad_or_crop(
    source: &[u8],
    source_shape: &[u64],
    target_shape: &[u64],
    element_size: usize,
    fill_value: &FillValue,
) -> Result<Vec<u8>, CodecError> {
    if source_shape.len() != target_shape.len() {
        return Err(CodecError::Other(format!(
            "cannot resize a {} dimensional buffer to {} dimensions",
            source_shape.len(),
            target_shape.len()
        )));
    }
    if fill_value.size() != element_size {
        return Err(CodecError::Other(format!(
            "fill value has {} bytes, expected {element_size}",
            fill_value.size()
        )));
    }
    let source_elements: u64 = source_shape.iter().product();
    let expected = usize::try_from(source_elements).unwrap_or(usize::MAX) * element_size;
    if source.len() != expected {
        return Err(CodecError::UnexpectedChunkSize(source.len(), expected));
    }

    let target_elements: u64 = target_shape.iter().product();
    let mut target = fill_value
        .as_ne_bytes()
        .repeat(usize::try_from(target_elements).unwrap_or(usize::MAX));

    let overlap: Vec<usize> = std::iter::zip(source_shape, target_shape)
        .map(|(source_extent, target_extent)| {
            usize::try_from(*source_extent.min(target_extent)).unwrap_or(usize::MAX)
        })
        .collect();
    if overlap.is_empty() {
        // Zero dimensional buffers hold a single element.
        let len = element_size.min(source.len()).min(target.len());
        target[..len].copy_from_slice(&source[..len]);
        return Ok(target);
    }
    if overlap.contains(&0) {
        return Ok(target);
    }

    let source_strides = byte_strides(source_shape, element_size);
    let target_strides = byte_strides(target_shape, element_size);
    let row_len = overlap[overlap.len() - 1] * element_size;
    let mut index = vec![0usize; overlap.len() - 1];
    'rows: loop {
        let source_offset: usize = std::iter::zip(&index, &source_strides)
            .map(|(i, stride)| i * stride)
            .sum();
        let target_offset: usize = std::iter::zip(&index, &target_strides)
            .map(|(i, stride)| i * stride)
            .sum();
        target[target_offset..target_offset + row_len]
            .copy_from_slice(&source[source_offset..source_offset + row_len]);
        for d in (0..index.len()).rev() {
            index[d] += 1;
            if index[d] < overlap[d] {
                continue 'rows;
            }
            index[d] = 0;
        }
        break;
    }
    Ok(target)
}
