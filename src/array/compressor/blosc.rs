//! The `blosc` compressor, backed by the `blosc-src` FFI bindings.
//!
//! Uses the context (`_ctx`) variants of the blosc entry points, which are
//! thread safe without `blosc_init`.

use std::ffi::{c_char, c_int, c_void};

use blosc_sys::{
    blosc_cbuffer_validate, blosc_compress_ctx, blosc_decompress_ctx, BLOSC_BITSHUFFLE,
    BLOSC_MAX_OVERHEAD, BLOSC_NOSHUFFLE, BLOSC_SHUFFLE,
};

use super::{BloscCompressorConfiguration, BloscShuffleMode, CodecError};

/// Resolve the shuffle mode to the blosc constant.
///
/// `AutoShuffle` follows the numcodecs convention: bit shuffling for
/// single-byte elements, byte shuffling otherwise.
fn shuffle_constant(shuffle: BloscShuffleMode, typesize: usize) -> u32 {
    match shuffle {
        BloscShuffleMode::NoShuffle => BLOSC_NOSHUFFLE,
        BloscShuffleMode::Shuffle => BLOSC_SHUFFLE,
        BloscShuffleMode::BitShuffle => BLOSC_BITSHUFFLE,
        BloscShuffleMode::AutoShuffle => {
            if typesize == 1 {
                BLOSC_BITSHUFFLE
            } else {
                BLOSC_SHUFFLE
            }
        }
    }
}

pub(super) fn encode(
    decoded: &[u8],
    configuration: &BloscCompressorConfiguration,
    element_size: usize,
) -> Result<Vec<u8>, CodecError> {
    let typesize = element_size.max(1);
    let doshuffle = shuffle_constant(configuration.shuffle, typesize);
    let mut encoded: Vec<u8> = vec![0; decoded.len() + BLOSC_MAX_OVERHEAD as usize];
    // SAFETY: the source and destination buffer sizes passed match the
    // allocations, and the compressor name is NUL terminated.
    let destsize = unsafe {
        blosc_compress_ctx(
            c_int::try_from(configuration.clevel.as_u32())
                .map_err(|err| CodecError::Other(err.to_string()))?,
            doshuffle as c_int,
            typesize,
            decoded.len(),
            decoded.as_ptr().cast::<c_void>(),
            encoded.as_mut_ptr().cast::<c_void>(),
            encoded.len(),
            configuration.cname.as_cstr().as_ptr().cast::<c_char>(),
            configuration.blocksize,
            c_int::try_from(configuration.nthreads.max(1))
                .map_err(|err| CodecError::Other(err.to_string()))?,
        )
    };
    if destsize > 0 {
        encoded.truncate(usize::try_from(destsize).unwrap_or_default());
        Ok(encoded)
    } else {
        Err(CodecError::Other(format!(
            "blosc compression failed with status {destsize}"
        )))
    }
}

pub(super) fn decode(
    encoded: &[u8],
    configuration: &BloscCompressorConfiguration,
) -> Result<Vec<u8>, CodecError> {
    let mut destsize: usize = 0;
    // SAFETY: cbytes matches the length of the encoded buffer.
    let valid = unsafe {
        blosc_cbuffer_validate(
            encoded.as_ptr().cast::<c_void>(),
            encoded.len(),
            std::ptr::addr_of_mut!(destsize),
        )
    };
    if valid != 0 {
        return Err(CodecError::Other(
            "blosc header validation failed".to_string(),
        ));
    }
    let mut decoded: Vec<u8> = vec![0; destsize];
    // SAFETY: the destination size was validated against the blosc header.
    let status = unsafe {
        blosc_decompress_ctx(
            encoded.as_ptr().cast::<c_void>(),
            decoded.as_mut_ptr().cast::<c_void>(),
            decoded.len(),
            c_int::try_from(configuration.nthreads.max(1))
                .map_err(|err| CodecError::Other(err.to_string()))?,
        )
    };
    if status >= 0 && usize::try_from(status).unwrap_or_default() == destsize {
        Ok(decoded)
    } else {
        Err(CodecError::Other(format!(
            "blosc decompression failed with status {status}"
        )))
    }
}
